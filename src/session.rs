//! # Navigation Session
//!
//! The stateful facade over the engine. A session owns the loaded trail,
//! the POI set and its spatial index, the observer's last position, and the
//! direction tracker, and exposes the operations a navigation frontend
//! drives: load data, feed position fixes, pick entry points, and pull the
//! current ranked view.
//!
//! Sessions are single-observer and not internally synchronized; wrap one
//! in whatever locking the embedding application uses.

use log::{debug, info, warn};

use crate::cluster::{cluster, merge, NavEntry};
use crate::direction::{DirectionTracker, TravelDirection};
use crate::error::Result;
use crate::geo_utils::initial_bearing;
use crate::ingest;
use crate::ranking::{rank, RankOutcome, RankedPoi};
use crate::spatial::PoiIndex;
use crate::trail::TrailIndex;
use crate::{Bounds, GeoPoint, NavConfig, Poi, TravelMode};

/// One GPS fix as delivered by the positioning layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported horizontal accuracy in meters, if the device provides one.
    pub accuracy_m: Option<f64>,
    /// Device compass heading in degrees, if available.
    pub heading: Option<f64>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            heading: None,
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }
}

/// A named place where the observer can join the trail.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub name: String,
    pub coords: GeoPoint,
}

/// Observer position state carried between fixes.
#[derive(Debug, Clone, Copy)]
struct ObserverState {
    position: GeoPoint,
    bearing: Option<f64>,
}

/// Direction state as presented to the frontend.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionSnapshot {
    pub direction: TravelDirection,
    pub manual_override: bool,
    /// Endpoint name the observer is heading toward, when known.
    pub heading_toward: Option<String>,
}

/// One row of the navigation view: a cluster or solo entry plus its ETA at
/// the session's travel mode.
#[derive(Debug, Clone)]
pub struct NavRow {
    pub entry: NavEntry,
    pub eta_minutes: f64,
}

/// The complete ranked view for one observer position.
#[derive(Debug, Clone)]
pub struct NavView {
    /// Nearest-first entries ahead of the observer.
    pub ahead: Vec<NavRow>,
    /// Nearest-first entries behind the observer.
    pub behind: Vec<NavRow>,
    /// POIs dropped from the pass for invalid coordinates.
    pub excluded: usize,
    pub direction: DirectionSnapshot,
    /// Observer's along-trail position from the trail start, in km.
    pub user_trail_km: f64,
    pub trail_total_km: f64,
}

/// Stateful navigation engine for one observer on one trail.
#[derive(Debug, Default)]
pub struct NavigationSession {
    trail: Option<TrailIndex>,
    pois: Vec<Poi>,
    poi_index: PoiIndex,
    observer: Option<ObserverState>,
    tracker: DirectionTracker,
    config: NavConfig,
    /// Category slug filter; `None` shows everything.
    filter: Option<String>,
    mode: TravelMode,
    base_entries: Vec<EntryPoint>,
}

impl NavigationSession {
    pub fn new(config: NavConfig) -> Self {
        Self {
            tracker: DirectionTracker::new(config.direction_epsilon),
            config,
            ..Default::default()
        }
    }

    // =========================================================================
    // Data loading
    // =========================================================================

    /// Load a trail from a route payload, replacing any previous trail.
    ///
    /// Position and direction state are cleared; trail-relative values
    /// from the old trail are meaningless on the new one.
    pub fn load_route(&mut self, json: &str) -> Result<()> {
        let trail = ingest::parse_route(json)?;
        self.set_trail(trail);
        Ok(())
    }

    /// Install an already-built trail index. Same state reset as
    /// [`load_route`](Self::load_route).
    pub fn set_trail(&mut self, trail: TrailIndex) {
        info!(
            "Loaded trail '{}' ({:.2} km, {} points)",
            trail.name(),
            trail.total_km(),
            trail.points().len()
        );
        self.trail = Some(trail);
        self.observer = None;
        self.tracker.reset();
    }

    /// Load POIs from a places payload, replacing any previous set.
    pub fn load_pois(&mut self, json: &str) -> Result<()> {
        let pois = ingest::parse_pois(json)?;
        self.set_pois(pois);
        Ok(())
    }

    /// Install a POI set directly. Duplicate ids keep the first record;
    /// invalid coordinates are dropped.
    pub fn set_pois(&mut self, pois: Vec<Poi>) {
        let mut seen: Vec<u64> = Vec::with_capacity(pois.len());
        let mut kept: Vec<Poi> = Vec::with_capacity(pois.len());

        for poi in pois {
            if !poi.coords.is_valid() {
                warn!("Dropping POI {} with invalid coordinates", poi.id);
                continue;
            }
            if seen.contains(&poi.id) {
                warn!("Dropping duplicate POI id {}", poi.id);
                continue;
            }
            seen.push(poi.id);
            kept.push(poi);
        }

        info!("Loaded {} POIs", kept.len());
        self.poi_index = PoiIndex::build(&kept);
        self.pois = kept;
    }

    /// Replace the configured entry points (trail endpoints are always
    /// added around these, see [`entry_points`](Self::entry_points)).
    pub fn set_entry_points(&mut self, entries: Vec<EntryPoint>) {
        self.base_entries = entries;
    }

    // =========================================================================
    // Observer updates
    // =========================================================================

    /// Feed one position fix.
    ///
    /// The fix's own heading wins when present; otherwise a bearing is
    /// derived from the previous position. The direction tracker sees the
    /// observer's normalized trail position plus the heading evidence.
    pub fn position_fix(&mut self, fix: PositionFix) {
        let position = GeoPoint::new(fix.latitude, fix.longitude);
        if !position.is_valid() {
            warn!("Ignoring position fix with invalid coordinates");
            return;
        }

        let previous = self.observer.map(|o| o.position);
        let bearing = fix.heading.or_else(|| {
            previous.and_then(|prev| {
                if prev == position {
                    None
                } else {
                    Some(initial_bearing(&prev, &position))
                }
            })
        });

        self.observer = Some(ObserverState { position, bearing });

        if let Some(trail) = &self.trail {
            if let Some(projection) = trail.project(&position) {
                let fraction = trail.fraction_of(&projection);
                let tangent = trail.tangent_bearing(projection.segment_index);
                self.tracker.observe(fraction, bearing, Some(tangent));
                debug!(
                    "Position fix at {:.2} km along trail ({:?})",
                    projection.along_km,
                    self.tracker.direction()
                );
            }
        }
    }

    /// Entry points in trail order: the trail start, the configured base
    /// entries, then the trail end. Empty without a trail.
    pub fn entry_points(&self) -> Vec<EntryPoint> {
        let Some(trail) = &self.trail else {
            return Vec::new();
        };

        let mut entries = Vec::with_capacity(self.base_entries.len() + 2);
        entries.push(EntryPoint {
            name: trail
                .start_name()
                .unwrap_or("Trail start")
                .to_string(),
            coords: trail.start(),
        });
        entries.extend(self.base_entries.iter().cloned());
        entries.push(EntryPoint {
            name: trail.end_name().unwrap_or("Trail end").to_string(),
            coords: trail.end(),
        });
        entries
    }

    /// Place the observer at an entry point.
    ///
    /// This is a teleport, not movement: the previous position and bearing
    /// are cleared and the direction tracker forgets its position history,
    /// so the jump never reads as travel along the trail. A manual
    /// direction override survives.
    pub fn select_entry_point(&mut self, index: usize) -> bool {
        let entries = self.entry_points();
        let Some(entry) = entries.get(index) else {
            warn!("Entry point index {index} out of range ({})", entries.len());
            return false;
        };

        info!("Observer placed at entry point '{}'", entry.name);
        self.observer = Some(ObserverState {
            position: entry.coords,
            bearing: None,
        });
        self.tracker.forget_position();
        true
    }

    /// Manually pin the travel direction.
    pub fn set_direction(&mut self, direction: TravelDirection) {
        self.tracker.set_manual(direction);
    }

    /// Clear any manual direction and all inference history.
    pub fn reset_direction(&mut self) {
        self.tracker.reset();
    }

    /// Current direction as the frontend should present it.
    pub fn direction_snapshot(&self) -> DirectionSnapshot {
        let direction = self.tracker.direction();
        let heading_toward = self.trail.as_ref().and_then(|t| match direction {
            TravelDirection::TowardEnd => t.end_name().map(str::to_string),
            TravelDirection::TowardStart => t.start_name().map(str::to_string),
            TravelDirection::Unknown => None,
        });

        DirectionSnapshot {
            direction,
            manual_override: self.tracker.is_manual(),
            heading_toward,
        }
    }

    // =========================================================================
    // View configuration
    // =========================================================================

    /// Restrict the view to POIs carrying a category slug; `None` clears.
    pub fn set_filter(&mut self, category_slug: Option<String>) {
        self.filter = category_slug;
    }

    pub fn set_mode(&mut self, mode: TravelMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the session can produce a navigation view.
    pub fn is_ready(&self) -> bool {
        self.trail.is_some() && self.observer.is_some() && !self.pois.is_empty()
    }

    pub fn trail(&self) -> Option<&TrailIndex> {
        self.trail.as_ref()
    }

    /// Observer's last accepted position.
    pub fn position(&self) -> Option<GeoPoint> {
        self.observer.map(|o| o.position)
    }

    /// Loaded POIs inside a bounding box, unordered.
    pub fn pois_in_viewport(&self, bounds: &Bounds) -> Vec<&Poi> {
        self.poi_index
            .query_viewport(bounds)
            .into_iter()
            .filter_map(|id| self.pois.iter().find(|p| p.id == id))
            .collect()
    }

    /// Loaded POI nearest to a point.
    pub fn nearest_poi(&self, point: &GeoPoint) -> Option<&Poi> {
        let id = self.poi_index.nearest(point)?;
        self.pois.iter().find(|p| p.id == id)
    }

    /// Run a full ranking pass over the (filtered) POI set.
    ///
    /// Returns `None` when the session is not ready or the observer fails
    /// to project onto the trail.
    pub fn rank_all(&self) -> Option<RankOutcome> {
        if !self.is_ready() {
            return None;
        }
        let trail = self.trail.as_ref()?;
        let observer = self.observer.as_ref()?;
        let user = trail.project(&observer.position)?;

        let filtered: Vec<Poi> = match &self.filter {
            Some(slug) => self
                .pois
                .iter()
                .filter(|p| p.has_category(slug))
                .cloned()
                .collect(),
            None => self.pois.clone(),
        };

        Some(rank(
            trail,
            &user,
            &observer.position,
            observer.bearing,
            self.tracker.direction(),
            &filtered,
        ))
    }

    /// Produce the current navigation view, or `None` when not ready.
    ///
    /// Ranked lists are capped to the configured ahead/behind limits
    /// before clustering, so a cluster never hides more than the caps
    /// would have shown.
    pub fn navigation_view(&self) -> Option<NavView> {
        let outcome = self.rank_all()?;
        let trail = self.trail.as_ref()?;
        let observer = self.observer.as_ref()?;
        let user = trail.project(&observer.position)?;

        let ahead = self.present(&outcome.ahead, self.config.ahead_limit);
        let behind = self.present(&outcome.behind, self.config.behind_limit);

        Some(NavView {
            ahead,
            behind,
            excluded: outcome.excluded,
            direction: self.direction_snapshot(),
            user_trail_km: user.along_km,
            trail_total_km: trail.total_km(),
        })
    }

    /// Cap, cluster, and attach ETAs to one side of the ranked result.
    fn present(&self, ranked: &[RankedPoi], cap: usize) -> Vec<NavRow> {
        let capped = &ranked[..ranked.len().min(cap)];
        merge(cluster(capped, self.config.cluster_radius_km))
            .into_iter()
            .map(|entry| {
                let eta_minutes = self.mode.eta_minutes(entry.distance_km());
                NavRow { entry, eta_minutes }
            })
            .collect()
    }
}
