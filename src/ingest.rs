//! # Payload Ingest
//!
//! Deserializes the two upstream JSON payloads into engine types: a route
//! export (nested `route.track_points` with `x`/`y` coordinate fields) and
//! a places listing (directory records with stringly-typed coordinates and
//! rendered-HTML title fields).
//!
//! Ingest is the lenient boundary. Individual bad POI records are skipped
//! with a warning rather than failing the whole load; a route payload with
//! fewer than two usable points is an error because nothing downstream can
//! work without a trail.

use log::warn;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, TrailNavError};
use crate::trail::TrailIndex;
use crate::{Category, GeoPoint, Poi, Tag};

// =============================================================================
// Route payload
// =============================================================================

#[derive(Debug, Deserialize)]
struct RouteEnvelope {
    route: RouteBody,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start_name: Option<String>,
    #[serde(default)]
    end_name: Option<String>,
    #[serde(default)]
    track_points: Vec<TrackPoint>,
}

/// Track points use `x` for longitude and `y` for latitude.
#[derive(Debug, Deserialize)]
struct TrackPoint {
    x: f64,
    y: f64,
}

/// Parse a route payload into a trail index.
pub fn parse_route(json: &str) -> Result<TrailIndex> {
    let envelope: RouteEnvelope = serde_json::from_str(json)?;
    let body = envelope.route;

    let points: Vec<GeoPoint> = body
        .track_points
        .iter()
        .map(|tp| GeoPoint::new(tp.y, tp.x))
        .filter(|p| p.is_valid())
        .collect();

    let dropped = body.track_points.len() - points.len();
    if dropped > 0 {
        warn!("Route payload contained {dropped} invalid track points");
    }

    if points.len() < 2 {
        return Err(TrailNavError::MalformedRoutePayload {
            reason: format!(
                "route has {} usable track points, need at least 2",
                points.len()
            ),
        });
    }

    let name = body.name.unwrap_or_else(|| "unnamed route".to_string());
    Ok(TrailIndex::new(name, points)?.with_endpoint_names(body.start_name, body.end_name))
}

// =============================================================================
// Places payload
// =============================================================================

#[derive(Debug, Deserialize)]
struct PlaceRecord {
    id: u64,
    #[serde(default)]
    title: Option<Rendered>,
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(default)]
    content: Option<PlaceContent>,
    #[serde(default)]
    featured_image: Vec<FeaturedImage>,
    #[serde(default)]
    post_tags: Vec<RawTag>,
    #[serde(default)]
    post_category: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct PlaceContent {
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    rendered: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeaturedImage {
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(default)]
    slug: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default)]
    slug: String,
    #[serde(default)]
    name: String,
}

/// Coordinates arrive either as JSON numbers or as strings like "45.98".
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
        Null,
    }

    Ok(match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(v) => Some(v),
        NumOrStr::Str(s) => s.trim().parse().ok(),
        NumOrStr::Null => None,
    })
}

/// Strip the `NN-` ordering prefix directory slugs carry, e.g.
/// `12-brewery` becomes `brewery`.
fn strip_order_prefix(slug: &str) -> &str {
    match slug.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => slug,
    }
}

/// Parse a places payload into a POI list.
///
/// Records without usable coordinates or an id collision are skipped with
/// a warning. An unparseable document is an error.
pub fn parse_pois(json: &str) -> Result<Vec<Poi>> {
    let records: Vec<serde_json::Value> = serde_json::from_str(json)?;

    let mut pois: Vec<Poi> = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for value in records {
        let record: PlaceRecord = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed place record: {e}");
                skipped += 1;
                continue;
            }
        };

        let (Some(lat), Some(lon)) = (record.latitude, record.longitude) else {
            warn!("Skipping place {} without coordinates", record.id);
            skipped += 1;
            continue;
        };
        let coords = GeoPoint::new(lat, lon);
        if !coords.is_valid() {
            warn!("Skipping place {} with invalid coordinates", record.id);
            skipped += 1;
            continue;
        }

        let name = record
            .title
            .map(|t| t.rendered)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("place {}", record.id));

        let description = record
            .content
            .and_then(|c| c.raw.or(c.rendered))
            .unwrap_or_default();

        let image_url = record
            .featured_image
            .into_iter()
            .next()
            .and_then(|img| img.source_url);

        let tags = record
            .post_tags
            .into_iter()
            .map(|t| Tag {
                slug: strip_order_prefix(&t.slug).to_string(),
                name: t.name,
            })
            .collect();

        // The catch-all "business" category carries no navigation signal
        let categories = record
            .post_category
            .into_iter()
            .filter(|c| c.slug != "business")
            .map(|c| Category {
                slug: strip_order_prefix(&c.slug).to_string(),
                name: c.name,
            })
            .collect();

        pois.push(Poi {
            id: record.id,
            name,
            coords,
            tags,
            categories,
            description,
            image_url,
        });
    }

    if pois.is_empty() && skipped > 0 {
        return Err(TrailNavError::MalformedPoiPayload {
            reason: format!("all {skipped} place records were unusable"),
        });
    }

    if skipped > 0 {
        warn!("Skipped {skipped} of {} place records", pois.len() + skipped);
    }

    Ok(pois)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let json = r#"{
            "route": {
                "name": "River Loop",
                "start_name": "Old Mill",
                "end_name": "Harbor",
                "track_points": [
                    {"x": 0.0, "y": 0.0},
                    {"x": 0.5, "y": 0.0},
                    {"x": 1.0, "y": 0.0}
                ]
            }
        }"#;

        let trail = parse_route(json).unwrap();
        assert_eq!(trail.name(), "River Loop");
        assert_eq!(trail.start_name(), Some("Old Mill"));
        assert_eq!(trail.end_name(), Some("Harbor"));
        assert_eq!(trail.points().len(), 3);
        // x is longitude
        assert_eq!(trail.end().longitude, 1.0);
    }

    #[test]
    fn test_parse_route_drops_invalid_points() {
        let json = r#"{
            "route": {
                "track_points": [
                    {"x": 0.0, "y": 0.0},
                    {"x": 0.5, "y": 99.0},
                    {"x": 1.0, "y": 0.0}
                ]
            }
        }"#;

        let trail = parse_route(json).unwrap();
        assert_eq!(trail.points().len(), 2);
    }

    #[test]
    fn test_parse_route_too_short_is_error() {
        let json = r#"{"route": {"track_points": [{"x": 0.0, "y": 0.0}]}}"#;
        let err = parse_route(json).unwrap_err();
        assert!(matches!(err, TrailNavError::MalformedRoutePayload { .. }));
    }

    #[test]
    fn test_parse_route_bad_json_is_error() {
        assert!(matches!(
            parse_route("not json").unwrap_err(),
            TrailNavError::Payload(_)
        ));
    }

    #[test]
    fn test_parse_pois() {
        let json = r#"[
            {
                "id": 7,
                "title": {"rendered": "Trailside Taproom"},
                "latitude": "45.5",
                "longitude": "-122.6",
                "content": {"raw": "Beer by the river"},
                "featured_image": [{"source_url": "https://img.example/7.jpg"}],
                "post_tags": [{"slug": "3-drink", "name": "Drink"}],
                "post_category": [
                    {"slug": "business", "name": "Business"},
                    {"slug": "12-brewery", "name": "Brewery"}
                ]
            }
        ]"#;

        let pois = parse_pois(json).unwrap();
        assert_eq!(pois.len(), 1);
        let poi = &pois[0];
        assert_eq!(poi.id, 7);
        assert_eq!(poi.name, "Trailside Taproom");
        assert_eq!(poi.coords.latitude, 45.5);
        assert_eq!(poi.description, "Beer by the river");
        assert_eq!(poi.image_url.as_deref(), Some("https://img.example/7.jpg"));
        // Order prefixes stripped, "business" dropped
        assert_eq!(poi.tags[0].slug, "drink");
        assert_eq!(poi.categories.len(), 1);
        assert_eq!(poi.categories[0].slug, "brewery");
    }

    #[test]
    fn test_parse_pois_numeric_coordinates() {
        let json = r#"[{"id": 1, "latitude": 45.5, "longitude": -122.6}]"#;
        let pois = parse_pois(json).unwrap();
        assert_eq!(pois[0].coords.longitude, -122.6);
        assert_eq!(pois[0].name, "place 1");
    }

    #[test]
    fn test_parse_pois_skips_bad_records() {
        let json = r#"[
            {"id": 1, "latitude": 45.5, "longitude": -122.6},
            {"id": 2, "latitude": "not-a-number", "longitude": -122.6},
            {"id": 3}
        ]"#;

        let pois = parse_pois(json).unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].id, 1);
    }

    #[test]
    fn test_parse_pois_all_bad_is_error() {
        let json = r#"[{"id": 1}, {"id": 2}]"#;
        assert!(matches!(
            parse_pois(json).unwrap_err(),
            TrailNavError::MalformedPoiPayload { .. }
        ));
    }

    #[test]
    fn test_strip_order_prefix() {
        assert_eq!(strip_order_prefix("12-brewery"), "brewery");
        assert_eq!(strip_order_prefix("drink"), "drink");
        assert_eq!(strip_order_prefix("mixed-12"), "mixed-12");
        assert_eq!(strip_order_prefix("3-ice-cream"), "ice-cream");
    }
}
