//! # Proximity Ranker
//!
//! The single ranking pass: annotate every POI with trail-relative
//! distances, partition into ahead/behind relative to the observer, and
//! sort by effective distance.
//!
//! The combined metric blends the along-trail distance with the lateral
//! offset as orthogonal axes (`sqrt(along² + lateral²)`), so a POI far off
//! the trail ranks progressively worse instead of being cut off at a fixed
//! radius.
//!
//! Partition policy: when the travel direction is known, POIs strictly
//! further along the trail in that direction are ahead and everything else
//! is behind. When direction is unknown, the pass falls back to bucketing
//! by heading: a POI whose bearing from the observer is within 90° of the
//! observer's bearing is ahead. An observer with no bearing at all defaults
//! to 0° (due north); that fallback is deliberate and documented rather
//! than hidden.
//!
//! Output lists are never truncated here. Display caps belong to the
//! presentation boundary so tests can assert on the full ranked result.

use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::direction::TravelDirection;
use crate::geo_utils::{angular_difference, haversine_km, initial_bearing};
use crate::trail::{TrailIndex, TrailProjection};
use crate::{GeoPoint, Poi};

/// A POI annotated with trail-relative distances for one ranking pass.
///
/// Annotations are recomputed from scratch on every pass; a `RankedPoi`
/// never carries values from a previous trail or observer position.
#[derive(Debug, Clone)]
pub struct RankedPoi {
    pub poi: Poi,
    /// Along-trail distance between the POI's and the observer's
    /// projections, in km.
    pub along_km: f64,
    /// Perpendicular offset of the POI from the trail, in km.
    pub lateral_km: f64,
    /// Euclidean blend of the along-trail and lateral distances, in km.
    pub combined_km: f64,
    /// The POI's own along-trail position from the trail start, in km.
    pub trail_position_km: f64,
}

/// Result of one ranking pass.
///
/// `ahead` and `behind` form a strict partition of every POI that
/// projected successfully; `excluded` counts the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub ahead: Vec<RankedPoi>,
    pub behind: Vec<RankedPoi>,
    pub excluded: usize,
}

/// Rank a POI set relative to an observer on the trail.
///
/// `user_projection` must come from the same `trail`. POIs with invalid
/// coordinates are excluded and counted, never fatal to the pass.
pub fn rank(
    trail: &TrailIndex,
    user_projection: &TrailProjection,
    observer_position: &GeoPoint,
    observer_bearing: Option<f64>,
    direction: TravelDirection,
    pois: &[Poi],
) -> RankOutcome {
    let annotated = annotate(trail, user_projection, pois);
    let excluded = pois.len() - annotated.len();
    if excluded > 0 {
        warn!("Ranking pass excluded {excluded} POIs with invalid coordinates");
    }

    let mut ahead = Vec::new();
    let mut behind = Vec::new();

    for ranked in annotated {
        if is_ahead(
            &ranked,
            user_projection,
            observer_position,
            observer_bearing,
            direction,
        ) {
            ahead.push(ranked);
        } else {
            behind.push(ranked);
        }
    }

    sort_by_distance(&mut ahead);
    sort_by_distance(&mut behind);

    debug!(
        "Ranking pass: {} ahead, {} behind, {} excluded ({:?})",
        ahead.len(),
        behind.len(),
        excluded,
        direction
    );

    RankOutcome {
        ahead,
        behind,
        excluded,
    }
}

/// Project every POI onto the trail and compute its distance annotations.
/// POIs that fail to project are dropped here and counted by the caller.
#[cfg(not(feature = "parallel"))]
fn annotate(
    trail: &TrailIndex,
    user_projection: &TrailProjection,
    pois: &[Poi],
) -> Vec<RankedPoi> {
    pois.iter()
        .filter_map(|poi| annotate_one(trail, user_projection, poi))
        .collect()
}

#[cfg(feature = "parallel")]
fn annotate(
    trail: &TrailIndex,
    user_projection: &TrailProjection,
    pois: &[Poi],
) -> Vec<RankedPoi> {
    pois.par_iter()
        .filter_map(|poi| annotate_one(trail, user_projection, poi))
        .collect()
}

fn annotate_one(
    trail: &TrailIndex,
    user_projection: &TrailProjection,
    poi: &Poi,
) -> Option<RankedPoi> {
    let projection = trail.project(&poi.coords)?;

    let along_km = trail.length_between(&projection, user_projection);
    let lateral_km = haversine_km(&poi.coords, &projection.snapped);
    let combined_km = (along_km * along_km + lateral_km * lateral_km).sqrt();

    if !combined_km.is_finite() {
        return None;
    }

    Some(RankedPoi {
        poi: poi.clone(),
        along_km,
        lateral_km,
        combined_km,
        trail_position_km: projection.along_km,
    })
}

fn is_ahead(
    ranked: &RankedPoi,
    user_projection: &TrailProjection,
    observer_position: &GeoPoint,
    observer_bearing: Option<f64>,
    direction: TravelDirection,
) -> bool {
    match direction {
        TravelDirection::TowardEnd => ranked.trail_position_km > user_projection.along_km,
        TravelDirection::TowardStart => ranked.trail_position_km < user_projection.along_km,
        TravelDirection::Unknown => {
            // Heading-relative fallback; bearing defaults to due north when
            // it was never established.
            let bearing = observer_bearing.unwrap_or(0.0);
            let to_poi = initial_bearing(observer_position, &ranked.poi.coords);
            angular_difference(to_poi, bearing) <= 90.0
        }
    }
}

/// Ascending by combined distance, POI id as the tie-break so repeated
/// passes over identical input produce order-identical lists.
fn sort_by_distance(list: &mut [RankedPoi]) {
    list.sort_by(|a, b| {
        a.combined_km
            .partial_cmp(&b.combined_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.poi.id.cmp(&b.poi.id))
    });
}
