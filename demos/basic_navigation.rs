//! Basic example of driving a navigation session.
//!
//! Run with: cargo run --example basic_navigation

use trailnav::{
    GeoPoint, NavConfig, NavEntry, NavigationSession, Poi, PositionFix, Tag, TrailIndex,
    TravelDirection,
};

fn main() {
    // A short straight trail along the equator, ~111 km end to end
    let trail = TrailIndex::new(
        "Canal Trail",
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.5),
            GeoPoint::new(0.0, 1.0),
        ],
    )
    .unwrap()
    .with_endpoint_names(Some("Lock 1".into()), Some("Lock 9".into()));

    // A few places along the way; the two taprooms share a tag so they
    // cluster when both are nearby
    let mut taproom = Poi::new(1, "Towpath Taproom", GeoPoint::new(0.0, 0.53));
    taproom.tags = vec![drink_tag()];
    let mut brewery = Poi::new(2, "Lockside Brewery", GeoPoint::new(0.0, 0.54));
    brewery.tags = vec![drink_tag()];
    let cafe = Poi::new(3, "Mile Nine Cafe", GeoPoint::new(0.0, 0.8));
    let museum = Poi::new(4, "Canal Museum", GeoPoint::new(0.0, 0.3));

    let mut session = NavigationSession::new(NavConfig::default());
    session.set_trail(trail);
    session.set_pois(vec![taproom, brewery, cafe, museum]);

    // Two fixes walking east establish the travel direction
    session.position_fix(PositionFix::new(0.0, 0.49));
    session.position_fix(PositionFix::new(0.0, 0.50));

    let view = session.navigation_view().expect("session is ready");

    println!("Trail Navigation Example\n");
    println!(
        "Position: {:.1} km of {:.1} km",
        view.user_trail_km, view.trail_total_km
    );
    match view.direction.direction {
        TravelDirection::Unknown => println!("Direction: unknown"),
        _ => println!(
            "Direction: toward {}",
            view.direction.heading_toward.as_deref().unwrap_or("?")
        ),
    }

    println!("\nAhead:");
    for row in &view.ahead {
        print_row(row.entry.label(), row.entry.poi_count(), &row.entry, row.eta_minutes);
    }

    println!("\nBehind:");
    for row in &view.behind {
        print_row(row.entry.label(), row.entry.poi_count(), &row.entry, row.eta_minutes);
    }
}

fn print_row(label: &str, count: usize, entry: &NavEntry, eta_minutes: f64) {
    let suffix = match entry {
        NavEntry::Cluster(_) => format!(" ({count} places)"),
        NavEntry::Solo(_) => String::new(),
    };
    println!(
        "   {label}{suffix}: {:.1} km, ~{:.0} min on foot",
        entry.distance_km(),
        eta_minutes
    );
}

fn drink_tag() -> Tag {
    Tag {
        slug: "drink".into(),
        name: "Drink".into(),
    }
}
