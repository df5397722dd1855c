//! # Trail Navigator
//!
//! Trail-relative navigation engine for linear trails.
//!
//! This library provides:
//! - Point-to-trail projection with along-trail and lateral distances
//! - Travel-direction inference from position fixes and device heading
//! - Proximity ranking of points of interest into ahead/behind lists
//! - Tag-based clustering of nearby POIs for compact display
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel POI annotation with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use trailnav::{
//!     GeoPoint, NavConfig, NavigationSession, Poi, PositionFix, TrailIndex,
//! };
//!
//! let trail = TrailIndex::new(
//!     "river trail",
//!     vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
//! )
//! .unwrap();
//!
//! let mut session = NavigationSession::new(NavConfig::default());
//! session.set_trail(trail);
//! session.set_pois(vec![Poi::new(1, "Trailside Cafe", GeoPoint::new(0.0, 0.6))]);
//! session.position_fix(PositionFix::new(0.0, 0.5));
//!
//! let view = session.navigation_view().unwrap();
//! assert_eq!(view.ahead.len() + view.behind.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

// Error taxonomy
pub mod error;
pub use error::{Result, TrailNavError};

// Spherical-geometry primitives
pub mod geo_utils;

// Trail polyline index and projections
pub mod trail;
pub use trail::{TrailIndex, TrailProjection};

// Travel-direction inference
pub mod direction;
pub use direction::{DirectionTracker, TravelDirection};

// Proximity ranking pass
pub mod ranking;
pub use ranking::{rank, RankOutcome, RankedPoi};

// Tag-based POI clustering
pub mod cluster;
pub use cluster::{cluster, merge, ClusterOutcome, NavEntry, PoiCluster};

// R-tree POI index for map queries
pub mod spatial;
pub use spatial::{IndexedPoi, PoiIndex};

// Upstream payload parsing
pub mod ingest;
pub use ingest::{parse_pois, parse_route};

// Stateful navigation session
pub mod session;
pub use session::{
    DirectionSnapshot, EntryPoint, NavRow, NavView, NavigationSession, PositionFix,
};

// =============================================================================
// Core Types
// =============================================================================

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Bounding box of a point sequence; `None` for empty input.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        geo_utils::compute_bounds(points)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A POI tag (clustering key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

/// A POI category (filtering key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
}

/// A point of interest near the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: u64,
    pub name: String,
    pub coords: GeoPoint,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Poi {
    pub fn new(id: u64, name: impl Into<String>, coords: GeoPoint) -> Self {
        Self {
            id,
            name: name.into(),
            coords,
            tags: Vec::new(),
            categories: Vec::new(),
            description: String::new(),
            image_url: None,
        }
    }

    /// First tag, the one clustering groups by.
    pub fn primary_tag(&self) -> Option<&Tag> {
        self.tags.first()
    }

    /// Whether any category matches the given slug.
    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug == slug)
    }
}

/// How the observer moves along the trail; sets the speed ETAs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TravelMode {
    #[default]
    Walk,
    Run,
    Bike,
}

impl TravelMode {
    /// Assumed sustained speed in km/h.
    pub fn speed_kmh(self) -> f64 {
        match self {
            TravelMode::Walk => 5.0,
            TravelMode::Run => 8.0,
            TravelMode::Bike => 19.3,
        }
    }

    /// Minutes to cover a distance at this mode's speed.
    pub fn eta_minutes(self, distance_km: f64) -> f64 {
        distance_km / self.speed_kmh() * 60.0
    }
}

/// Session tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavConfig {
    /// Maximum ranked POIs shown ahead of the observer.
    pub ahead_limit: usize,
    /// Maximum ranked POIs shown behind the observer.
    pub behind_limit: usize,
    /// Clustering radius around a group's nearest member, in km.
    pub cluster_radius_km: f64,
    /// Minimum normalized along-trail movement that counts as direction
    /// evidence.
    pub direction_epsilon: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            ahead_limit: 5,
            behind_limit: 3,
            cluster_radius_km: 2.0,
            direction_epsilon: 1e-3,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
