//! Unified error handling for the trail navigation core.
//!
//! Errors here cover data rejected at the ingest boundary and invalid
//! construction input. Per-POI projection failures are not errors; the
//! ranking pass isolates and counts them instead. Missing prerequisites
//! (no trail yet, no position yet) are represented as `None` by the
//! session API, never as an error value.

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrailNavError>;

/// Errors produced by trail construction and payload ingest.
#[derive(Debug)]
pub enum TrailNavError {
    /// A trail needs at least two valid points to form a polyline.
    InsufficientTrailPoints {
        point_count: usize,
        minimum_required: usize,
    },
    /// A coordinate pair was non-finite or outside WGS84 bounds.
    InvalidCoordinate { lat: f64, lon: f64 },
    /// The route payload was structurally valid JSON but unusable.
    MalformedRoutePayload { reason: String },
    /// The POI payload was structurally valid JSON but unusable.
    MalformedPoiPayload { reason: String },
    /// The payload was not valid JSON at all.
    Payload(serde_json::Error),
}

impl fmt::Display for TrailNavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailNavError::InsufficientTrailPoints {
                point_count,
                minimum_required,
            } => write!(
                f,
                "trail has {point_count} points, at least {minimum_required} required"
            ),
            TrailNavError::InvalidCoordinate { lat, lon } => {
                write!(f, "invalid coordinate ({lat}, {lon})")
            }
            TrailNavError::MalformedRoutePayload { reason } => {
                write!(f, "malformed route payload: {reason}")
            }
            TrailNavError::MalformedPoiPayload { reason } => {
                write!(f, "malformed POI payload: {reason}")
            }
            TrailNavError::Payload(err) => write!(f, "payload parse error: {err}"),
        }
    }
}

impl std::error::Error for TrailNavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrailNavError::Payload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TrailNavError {
    fn from(err: serde_json::Error) -> Self {
        TrailNavError::Payload(err)
    }
}
