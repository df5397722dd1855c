//! # Geographic Utilities
//!
//! Core spherical-geometry primitives for trail navigation.
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees)
//! and report distances in kilometers. The haversine implementation comes
//! from the `geo` crate, which uses the mean Earth radius; results are
//! accurate to well within GPS noise for trail-scale distances.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_km`] | Great-circle distance between two points |
//! | [`initial_bearing`] | Initial compass bearing from one point to another |
//! | [`angular_difference`] | Minimal absolute difference between two bearings |
//! | [`polyline_length_km`] | Total length of a point sequence |
//! | [`compute_bounds`] | Bounding box of a point sequence |

use crate::{Bounds, GeoPoint};
use geo::{Distance, Haversine, Point};

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two points in kilometers.
///
/// # Example
///
/// ```rust
/// use trailnav::{geo_utils, GeoPoint};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_km(&london, &paris);
/// assert!((distance - 343.5).abs() < 2.0); // ~344 km
/// ```
#[inline]
pub fn haversine_km(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2) / 1000.0
}

/// Calculate the total length of a polyline in kilometers.
///
/// Empty or single-point sequences return 0.0.
pub fn polyline_length_km(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_km(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Bearing Functions
// =============================================================================

/// Initial compass bearing from `from` to `to`, in degrees `[0, 360)`.
///
/// Returns 0.0 when either point is invalid (non-finite or out of WGS84
/// range) so that a bad fix cannot push NaN through the ranking pipeline.
pub fn initial_bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    if !from.is_valid() || !to.is_valid() {
        return 0.0;
    }

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Minimal absolute angular difference between two bearings, in `[0, 180]`.
#[inline]
pub fn angular_difference(b1: f64, b2: f64) -> f64 {
    let diff = (b1 - b2).abs() % 360.0;
    diff.min(360.0 - diff)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a point sequence.
///
/// Returns `None` for empty input.
pub fn compute_bounds(points: &[GeoPoint]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
