//! # POI Spatial Index
//!
//! R-tree over the loaded POI set for viewport and nearest-neighbor
//! queries. Ranking does not use this index (it projects every POI onto
//! the trail anyway); the index exists for map-facing queries where a
//! linear scan over thousands of POIs per pan would be wasteful.
//!
//! The index stores POI ids plus coordinates only and is rebuilt wholesale
//! whenever the POI set is reloaded.

use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::{Bounds, GeoPoint, Poi};

/// Lightweight R-tree entry: POI id with its position as `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoi {
    pub id: u64,
    pub position: [f64; 2],
}

impl RTreeObject for IndexedPoi {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoi {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over a POI set.
#[derive(Debug, Default)]
pub struct PoiIndex {
    tree: RTree<IndexedPoi>,
    size: usize,
}

impl PoiIndex {
    /// Bulk-load an index from a POI slice. POIs with invalid coordinates
    /// are skipped; callers filter those at ingest so this is a safety net.
    pub fn build(pois: &[Poi]) -> Self {
        let entries: Vec<IndexedPoi> = pois
            .iter()
            .filter(|p| p.coords.is_valid())
            .map(|p| IndexedPoi {
                id: p.id,
                position: [p.coords.longitude, p.coords.latitude],
            })
            .collect();

        let size = entries.len();
        debug!("Built POI spatial index with {size} entries");

        Self {
            tree: RTree::bulk_load(entries),
            size,
        }
    }

    /// Ids of all POIs inside a bounding box, unordered.
    pub fn query_viewport(&self, bounds: &Bounds) -> Vec<u64> {
        let envelope = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );
        self.tree
            .locate_in_envelope(&envelope)
            .map(|e| e.id)
            .collect()
    }

    /// Id of the POI nearest to a point, if the index is non-empty.
    ///
    /// Nearest is in planar degree space, which is fine for the map-scale
    /// extents this index serves.
    pub fn nearest(&self, point: &GeoPoint) -> Option<u64> {
        if !point.is_valid() {
            return None;
        }
        self.tree
            .nearest_neighbor(&[point.longitude, point.latitude])
            .map(|e| e.id)
    }

    /// Number of indexed POIs.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the index holds no POIs.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
