//! # Direction Tracker
//!
//! Infers the observer's direction of travel along the trail from
//! consecutive position fixes, with a device-heading fallback and a manual
//! override for when the rider knows better than the sensors.
//!
//! Automatic inference never regresses an established direction back to
//! [`TravelDirection::Unknown`]; only an explicit [`DirectionTracker::reset`]
//! does that.

use log::debug;

use crate::geo_utils::angular_difference;

/// Direction of travel along the trail polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelDirection {
    /// No evidence yet.
    #[default]
    Unknown,
    /// Moving toward the trail's first vertex.
    TowardStart,
    /// Moving toward the trail's last vertex.
    TowardEnd,
}

impl TravelDirection {
    /// The opposite direction; Unknown stays Unknown.
    pub fn reversed(self) -> Self {
        match self {
            TravelDirection::TowardStart => TravelDirection::TowardEnd,
            TravelDirection::TowardEnd => TravelDirection::TowardStart,
            TravelDirection::Unknown => TravelDirection::Unknown,
        }
    }
}

/// Tracks travel direction from position fixes and heading evidence.
#[derive(Debug, Clone)]
pub struct DirectionTracker {
    direction: TravelDirection,
    manual_override: bool,
    prev_fraction: Option<f64>,
    /// Minimum normalized along-trail movement to count as evidence.
    epsilon: f64,
}

impl Default for DirectionTracker {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl DirectionTracker {
    /// Create a tracker with the given normalized-fraction epsilon.
    pub fn new(epsilon: f64) -> Self {
        Self {
            direction: TravelDirection::Unknown,
            manual_override: false,
            prev_fraction: None,
            epsilon,
        }
    }

    /// Current inferred or overridden direction.
    pub fn direction(&self) -> TravelDirection {
        self.direction
    }

    /// Whether the direction was set manually.
    pub fn is_manual(&self) -> bool {
        self.manual_override
    }

    /// Feed one position fix's evidence.
    ///
    /// `fraction` is the observer's normalized position along the trail,
    /// `observer_bearing` the current heading if known, and
    /// `tangent_bearing` the trail's local bearing at the snapped segment.
    ///
    /// With a position history, movement is the only evidence: a
    /// sub-epsilon delta is GPS wobble and holds the current direction.
    /// The bearing-vs-tangent rule applies only on a first fix, where no
    /// movement evidence can exist yet. Under manual override all evidence
    /// is ignored, including the position history, so that `reset`
    /// re-derives from scratch.
    pub fn observe(
        &mut self,
        fraction: f64,
        observer_bearing: Option<f64>,
        tangent_bearing: Option<f64>,
    ) {
        if self.manual_override {
            return;
        }

        match self.prev_fraction {
            Some(prev) => {
                let delta = fraction - prev;
                if delta.abs() > self.epsilon {
                    self.direction = if delta > 0.0 {
                        TravelDirection::TowardEnd
                    } else {
                        TravelDirection::TowardStart
                    };
                    debug!(
                        "Direction from movement: {:?} (delta {:.5})",
                        self.direction, delta
                    );
                }
                // Sub-epsilon wobble is not evidence; hold the direction
            }
            None => {
                if let (Some(bearing), Some(tangent)) = (observer_bearing, tangent_bearing) {
                    self.direction = if angular_difference(bearing, tangent) < 90.0 {
                        TravelDirection::TowardEnd
                    } else {
                        TravelDirection::TowardStart
                    };
                    debug!(
                        "Direction from heading: {:?} (bearing {:.1}, tangent {:.1})",
                        self.direction, bearing, tangent
                    );
                }
            }
        }

        self.prev_fraction = Some(fraction);
    }

    /// Drop the position history so the next fix is treated as a first
    /// fix. Used when the observer teleports (entry point selection);
    /// the established direction and any override are kept.
    pub fn forget_position(&mut self) {
        self.prev_fraction = None;
    }

    /// Manually pin the direction, suppressing automatic inference until
    /// [`reset`](Self::reset).
    pub fn set_manual(&mut self, direction: TravelDirection) {
        self.manual_override = true;
        self.direction = direction;
        debug!("Direction manually set: {:?}", direction);
    }

    /// Clear the override and all inference state; the next fix re-derives
    /// direction from scratch.
    pub fn reset(&mut self) {
        self.manual_override = false;
        self.direction = TravelDirection::Unknown;
        self.prev_fraction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unknown() {
        let tracker = DirectionTracker::default();
        assert_eq!(tracker.direction(), TravelDirection::Unknown);
        assert!(!tracker.is_manual());
    }

    #[test]
    fn test_movement_sets_direction() {
        let mut tracker = DirectionTracker::default();
        tracker.observe(0.50, None, None);
        assert_eq!(tracker.direction(), TravelDirection::Unknown);

        tracker.observe(0.51, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        tracker.observe(0.40, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardStart);
    }

    #[test]
    fn test_jitter_below_epsilon_holds_direction() {
        let mut tracker = DirectionTracker::default();
        tracker.observe(0.50, None, None);
        tracker.observe(0.60, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        // Sub-epsilon backward wobble does not flip
        tracker.observe(0.5995, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);
    }

    #[test]
    fn test_bearing_fallback_on_first_fix() {
        let mut tracker = DirectionTracker::default();
        // Heading east on an east-running trail
        tracker.observe(0.5, Some(92.0), Some(90.0));
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        let mut tracker = DirectionTracker::default();
        // Heading west against the same trail
        tracker.observe(0.5, Some(270.0), Some(90.0));
        assert_eq!(tracker.direction(), TravelDirection::TowardStart);
    }

    #[test]
    fn test_bearing_ignored_once_history_exists() {
        let mut tracker = DirectionTracker::default();
        tracker.observe(0.50, None, None);
        tracker.observe(0.60, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        // Sub-epsilon wobble with a backward-pointing bearing: movement
        // history exists, so the bearing carries no weight
        tracker.observe(0.6001, Some(270.0), Some(90.0));
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);
    }

    #[test]
    fn test_no_evidence_keeps_established_direction() {
        let mut tracker = DirectionTracker::default();
        tracker.observe(0.50, None, None);
        tracker.observe(0.60, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        // No bearing and no meaningful movement: hold, never regress
        tracker.observe(0.6001, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);
    }

    #[test]
    fn test_manual_override_suppresses_inference() {
        let mut tracker = DirectionTracker::default();
        tracker.set_manual(TravelDirection::TowardStart);
        assert!(tracker.is_manual());

        // Ten contradictory fixes: strong forward movement and forward heading
        for i in 0..10 {
            tracker.observe(0.1 + 0.05 * i as f64, Some(90.0), Some(90.0));
            assert_eq!(tracker.direction(), TravelDirection::TowardStart);
        }

        tracker.reset();
        assert_eq!(tracker.direction(), TravelDirection::Unknown);
        assert!(!tracker.is_manual());

        // Next fixes re-derive normally
        tracker.observe(0.50, None, None);
        tracker.observe(0.55, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);
    }

    #[test]
    fn test_forget_position_keeps_direction() {
        let mut tracker = DirectionTracker::default();
        tracker.observe(0.50, None, None);
        tracker.observe(0.60, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        // A teleport must not register as backward movement
        tracker.forget_position();
        tracker.observe(0.10, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardEnd);

        tracker.observe(0.05, None, None);
        assert_eq!(tracker.direction(), TravelDirection::TowardStart);
    }

    #[test]
    fn test_reversed() {
        assert_eq!(
            TravelDirection::TowardEnd.reversed(),
            TravelDirection::TowardStart
        );
        assert_eq!(
            TravelDirection::Unknown.reversed(),
            TravelDirection::Unknown
        );
    }
}
