//! # Trail Index
//!
//! Wraps an ordered polyline of GPS points and answers point-to-trail
//! queries: nearest point on the trail, cumulative distance from the trail
//! start, and the perpendicular offset of a point from the trail.
//!
//! The index is built once per route load and replaced wholesale on reload;
//! it is never mutated in place. Cumulative segment distances are
//! precomputed so every projection is a single scan over the segments.
//!
//! Loop trails (start adjacent to end) are not supported; along-trail
//! distance between two projections is always the simple difference of
//! their positions.

use log::debug;

use crate::error::{Result, TrailNavError};
use crate::geo_utils::{haversine_km, initial_bearing};
use crate::GeoPoint;

/// Result of snapping a geographic point onto a trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailProjection {
    /// Nearest point on the trail polyline.
    pub snapped: GeoPoint,
    /// Cumulative distance from the trail start to the snapped point, in km.
    pub along_km: f64,
    /// Index of the segment the snapped point lies on.
    pub segment_index: usize,
    /// Perpendicular distance from the query point to the snapped point, in km.
    pub lateral_km: f64,
}

/// An immutable polyline trail with precomputed cumulative distances.
#[derive(Debug, Clone)]
pub struct TrailIndex {
    name: String,
    start_name: Option<String>,
    end_name: Option<String>,
    points: Vec<GeoPoint>,
    /// cumulative_km[i] is the along-trail distance from the start to vertex i.
    cumulative_km: Vec<f64>,
    total_km: f64,
}

impl TrailIndex {
    /// Build a trail index from an ordered point sequence.
    ///
    /// Invalid points (non-finite or out of WGS84 range) are rejected with
    /// [`TrailNavError::InvalidCoordinate`]; fewer than two points is
    /// [`TrailNavError::InsufficientTrailPoints`]. Malformed payloads are
    /// expected to be filtered at the ingest boundary before reaching here,
    /// so both cases indicate a caller bug rather than bad upstream data.
    pub fn new(name: impl Into<String>, points: Vec<GeoPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(TrailNavError::InsufficientTrailPoints {
                point_count: points.len(),
                minimum_required: 2,
            });
        }

        if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
            return Err(TrailNavError::InvalidCoordinate {
                lat: bad.latitude,
                lon: bad.longitude,
            });
        }

        let mut cumulative_km = Vec::with_capacity(points.len());
        let mut running = 0.0;
        cumulative_km.push(0.0);
        for w in points.windows(2) {
            running += haversine_km(&w[0], &w[1]);
            cumulative_km.push(running);
        }

        let name = name.into();
        debug!(
            "Built trail index '{}': {} points, {:.2} km",
            name,
            points.len(),
            running
        );

        Ok(Self {
            name,
            start_name: None,
            end_name: None,
            points,
            cumulative_km,
            total_km: running,
        })
    }

    /// Attach human-readable endpoint names (used by direction indicators).
    pub fn with_endpoint_names(
        mut self,
        start_name: Option<String>,
        end_name: Option<String>,
    ) -> Self {
        self.start_name = start_name;
        self.end_name = end_name;
        self
    }

    /// Snap a point onto the trail.
    ///
    /// Every segment is checked; when a point is equidistant to two
    /// segments the lower index wins, which keeps projections
    /// deterministic and reproducible.
    ///
    /// Returns `None` if the query point itself is invalid.
    pub fn project(&self, point: &GeoPoint) -> Option<TrailProjection> {
        if !point.is_valid() {
            return None;
        }

        let mut best: Option<TrailProjection> = None;

        for (i, seg) in self.points.windows(2).enumerate() {
            let (snapped, t) = nearest_on_segment(point, &seg[0], &seg[1]);
            let lateral_km = haversine_km(point, &snapped);

            let better = match &best {
                Some(b) => lateral_km < b.lateral_km,
                None => true,
            };
            if better {
                let seg_len = self.cumulative_km[i + 1] - self.cumulative_km[i];
                best = Some(TrailProjection {
                    snapped,
                    along_km: self.cumulative_km[i] + t * seg_len,
                    segment_index: i,
                    lateral_km,
                });
            }
        }

        best
    }

    /// Absolute along-trail distance between two projections, in km.
    #[inline]
    pub fn length_between(&self, a: &TrailProjection, b: &TrailProjection) -> f64 {
        (a.along_km - b.along_km).abs()
    }

    /// Total trail length in kilometers.
    #[inline]
    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    /// Normalized position of a projection along the trail, in `[0, 1]`.
    pub fn fraction_of(&self, proj: &TrailProjection) -> f64 {
        if self.total_km > 0.0 {
            (proj.along_km / self.total_km).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Bearing of the trail's local tangent at a segment, in `[0, 360)`.
    ///
    /// Computed from the two vertices bracketing the segment, matching the
    /// resolution of the underlying polyline.
    pub fn tangent_bearing(&self, segment_index: usize) -> f64 {
        let i = segment_index.min(self.points.len() - 2);
        initial_bearing(&self.points[i], &self.points[i + 1])
    }

    /// Trail display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name of the trail's start, if known.
    pub fn start_name(&self) -> Option<&str> {
        self.start_name.as_deref()
    }

    /// Display name of the trail's end, if known.
    pub fn end_name(&self) -> Option<&str> {
        self.end_name.as_deref()
    }

    /// First vertex of the trail.
    pub fn start(&self) -> GeoPoint {
        self.points[0]
    }

    /// Last vertex of the trail.
    pub fn end(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// The trail's vertices in order.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }
}

/// Nearest point to `p` on the segment `a`-`b`, with the interpolation
/// parameter `t` in `[0, 1]`.
///
/// Geometry runs in a local equirectangular plane (longitude scaled by the
/// cosine of the latitude) which is accurate at segment scale; reported
/// distances elsewhere still use haversine.
fn nearest_on_segment(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> (GeoPoint, f64) {
    let lat_scale = a.latitude.to_radians().cos().max(1e-6);

    let ax = a.longitude * lat_scale;
    let ay = a.latitude;
    let bx = b.longitude * lat_scale;
    let by = b.latitude;
    let px = p.longitude * lat_scale;
    let py = p.latitude;

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;

    // Degenerate segment: snap to its first vertex
    if len_sq == 0.0 {
        return (*a, 0.0);
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);

    let snapped = GeoPoint::new(
        a.latitude + t * (b.latitude - a.latitude),
        a.longitude + t * (b.longitude - a.longitude),
    );
    (snapped, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Straight equatorial trail from (0,0) to (0,1) with a midpoint vertex.
    fn straight_trail() -> TrailIndex {
        TrailIndex::new(
            "straight",
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 0.5),
                GeoPoint::new(0.0, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_short_trail() {
        let err = TrailIndex::new("short", vec![GeoPoint::new(0.0, 0.0)]).unwrap_err();
        assert!(matches!(
            err,
            TrailNavError::InsufficientTrailPoints {
                point_count: 1,
                minimum_required: 2
            }
        ));
    }

    #[test]
    fn test_rejects_invalid_point() {
        let err = TrailIndex::new(
            "bad",
            vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(91.0, 0.0)],
        )
        .unwrap_err();
        assert!(matches!(err, TrailNavError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_total_length() {
        let trail = straight_trail();
        // One degree of longitude at the equator is ~111.2 km
        assert!(approx_eq(trail.total_km(), 111.2, 1.0));
    }

    #[test]
    fn test_project_point_on_trail_has_zero_lateral() {
        let trail = straight_trail();
        let on_trail = GeoPoint::new(0.0, 0.25);
        let proj = trail.project(&on_trail).unwrap();

        assert!(proj.lateral_km < 1e-6);
        assert_eq!(proj.segment_index, 0);
        // Along-trail position equals the cumulative length up to the point
        let expected = haversine_km(&GeoPoint::new(0.0, 0.0), &on_trail);
        assert!(approx_eq(proj.along_km, expected, 0.01));
    }

    #[test]
    fn test_project_vertices_monotone() {
        let trail = straight_trail();
        let mut prev = -1.0;
        for p in trail.points().to_vec() {
            let proj = trail.project(&p).unwrap();
            assert!(proj.along_km >= prev);
            prev = proj.along_km;
        }
    }

    #[test]
    fn test_project_off_trail_point() {
        let trail = straight_trail();
        // 0.1 degrees north of the trail midpoint
        let off = GeoPoint::new(0.1, 0.5);
        let proj = trail.project(&off).unwrap();

        assert!(approx_eq(proj.snapped.longitude, 0.5, 1e-6));
        assert!(approx_eq(proj.snapped.latitude, 0.0, 1e-6));
        // ~11 km lateral offset
        assert!(approx_eq(proj.lateral_km, 11.1, 0.5));
    }

    #[test]
    fn test_project_beyond_endpoint_clamps() {
        let trail = straight_trail();
        let past_end = GeoPoint::new(0.0, 1.5);
        let proj = trail.project(&past_end).unwrap();

        assert!(approx_eq(proj.along_km, trail.total_km(), 1e-6));
        assert_eq!(proj.segment_index, 1);
    }

    #[test]
    fn test_project_junction_prefers_lower_segment() {
        // The shared vertex of two segments is equidistant to both and
        // must resolve to the lower segment index.
        let trail = TrailIndex::new(
            "bend",
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 0.5),
                GeoPoint::new(0.5, 0.5),
            ],
        )
        .unwrap();

        let junction = GeoPoint::new(0.0, 0.5);
        let proj = trail.project(&junction).unwrap();
        assert_eq!(proj.segment_index, 0);
        assert!(proj.lateral_km < 1e-9);
    }

    #[test]
    fn test_project_invalid_point_is_none() {
        let trail = straight_trail();
        assert!(trail.project(&GeoPoint::new(f64::NAN, 0.0)).is_none());
    }

    #[test]
    fn test_length_between() {
        let trail = straight_trail();
        let a = trail.project(&GeoPoint::new(0.0, 0.2)).unwrap();
        let b = trail.project(&GeoPoint::new(0.0, 0.7)).unwrap();
        let expected = haversine_km(&GeoPoint::new(0.0, 0.2), &GeoPoint::new(0.0, 0.7));
        assert!(approx_eq(trail.length_between(&a, &b), expected, 0.05));
    }

    #[test]
    fn test_tangent_bearing() {
        let trail = straight_trail();
        assert!(approx_eq(trail.tangent_bearing(0), 90.0, 0.01));
        // Out-of-range index clamps to the last segment
        assert!(approx_eq(trail.tangent_bearing(99), 90.0, 0.01));
    }

    #[test]
    fn test_fraction_of() {
        let trail = straight_trail();
        let mid = trail.project(&GeoPoint::new(0.0, 0.5)).unwrap();
        assert!(approx_eq(trail.fraction_of(&mid), 0.5, 0.01));
    }
}
