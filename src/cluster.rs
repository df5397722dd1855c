//! # POI Clustering
//!
//! Groups ranked POIs that share a primary tag into named clusters for
//! compact display. A cluster's reference point is its first (nearest)
//! member's coordinate, not a computed centroid; every other member must
//! lie within the clustering radius of that reference or it is demoted to
//! a standalone entry. Singleton groups are demoted the same way.
//!
//! Input order matters: the ranked list arrives sorted ascending by
//! combined distance, so the reference member is always the nearest one
//! and cluster representative distances are the group minima.

use crate::geo_utils::haversine_km;
use crate::ranking::RankedPoi;

/// A group of nearby POIs sharing a primary tag.
#[derive(Debug, Clone)]
pub struct PoiCluster {
    /// Slug of the shared primary tag.
    pub tag_slug: String,
    /// Display name of the shared primary tag.
    pub label: String,
    /// Members, ascending by combined distance.
    pub members: Vec<RankedPoi>,
    /// Minimum member combined distance, in km. Used to merge-sort
    /// clusters with solo entries.
    pub representative_km: f64,
}

/// Clustered view of a ranked POI list.
#[derive(Debug, Clone, Default)]
pub struct ClusterOutcome {
    pub clusters: Vec<PoiCluster>,
    pub solos: Vec<RankedPoi>,
}

/// One entry of the merged cluster/solo display ordering.
#[derive(Debug, Clone)]
pub enum NavEntry {
    Cluster(PoiCluster),
    Solo(RankedPoi),
}

impl NavEntry {
    /// Distance used for display ordering, in km.
    pub fn distance_km(&self) -> f64 {
        match self {
            NavEntry::Cluster(c) => c.representative_km,
            NavEntry::Solo(r) => r.combined_km,
        }
    }

    /// Display label: the tag name for clusters, the POI name for solos.
    pub fn label(&self) -> &str {
        match self {
            NavEntry::Cluster(c) => &c.label,
            NavEntry::Solo(r) => &r.poi.name,
        }
    }

    /// Number of POIs this entry represents.
    pub fn poi_count(&self) -> usize {
        match self {
            NavEntry::Cluster(c) => c.members.len(),
            NavEntry::Solo(_) => 1,
        }
    }
}

/// Cluster a ranked POI list by primary tag within `radius_km`.
///
/// Untagged POIs are always solos. Output lists preserve ascending
/// distance order.
pub fn cluster(ranked: &[RankedPoi], radius_km: f64) -> ClusterOutcome {
    let mut clusters: Vec<PoiCluster> = Vec::new();
    let mut solos: Vec<RankedPoi> = Vec::new();

    // Tag groups in first-appearance order; the list is distance-sorted so
    // each group's first member is its nearest.
    let mut group_order: Vec<&str> = Vec::new();
    for entry in ranked {
        if let Some(tag) = entry.poi.primary_tag() {
            if !group_order.contains(&tag.slug.as_str()) {
                group_order.push(&tag.slug);
            }
        } else {
            solos.push(entry.clone());
        }
    }

    for slug in group_order {
        let members: Vec<&RankedPoi> = ranked
            .iter()
            .filter(|e| e.poi.primary_tag().is_some_and(|t| t.slug == slug))
            .collect();

        let reference = members[0];
        let mut kept: Vec<RankedPoi> = Vec::new();
        for member in &members {
            let within = haversine_km(&reference.poi.coords, &member.poi.coords) <= radius_km;
            if within {
                kept.push((*member).clone());
            } else {
                solos.push((*member).clone());
            }
        }

        if kept.len() < 2 {
            solos.extend(kept);
            continue;
        }

        let representative_km = kept[0].combined_km;
        let label = kept[0]
            .poi
            .primary_tag()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| slug.to_string());
        clusters.push(PoiCluster {
            tag_slug: slug.to_string(),
            label,
            members: kept,
            representative_km,
        });
    }

    clusters.sort_by(|a, b| {
        a.representative_km
            .partial_cmp(&b.representative_km)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    solos.sort_by(|a, b| {
        a.combined_km
            .partial_cmp(&b.combined_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.poi.id.cmp(&b.poi.id))
    });

    ClusterOutcome { clusters, solos }
}

/// Merge clusters and solos into one display ordering, ascending by
/// representative distance.
pub fn merge(outcome: ClusterOutcome) -> Vec<NavEntry> {
    let mut entries: Vec<NavEntry> = outcome
        .clusters
        .into_iter()
        .map(NavEntry::Cluster)
        .chain(outcome.solos.into_iter().map(NavEntry::Solo))
        .collect();

    entries.sort_by(|a, b| {
        a.distance_km()
            .partial_cmp(&b.distance_km())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeoPoint, Poi, Tag};

    fn ranked(id: u64, tag: Option<&str>, lat: f64, lon: f64, combined_km: f64) -> RankedPoi {
        RankedPoi {
            poi: Poi {
                id,
                name: format!("poi-{id}"),
                coords: GeoPoint::new(lat, lon),
                tags: tag
                    .map(|t| {
                        vec![Tag {
                            slug: t.to_string(),
                            name: t.to_uppercase(),
                        }]
                    })
                    .unwrap_or_default(),
                categories: vec![],
                description: String::new(),
                image_url: None,
            },
            along_km: combined_km,
            lateral_km: 0.0,
            combined_km,
            trail_position_km: 0.0,
        }
    }

    #[test]
    fn test_same_tag_within_radius_clusters() {
        // Three "drink" POIs within ~0.5 km of each other, one 10+ km away
        let input = vec![
            ranked(1, Some("drink"), 0.0, 0.500, 1.0),
            ranked(2, Some("drink"), 0.0, 0.502, 1.2),
            ranked(3, Some("drink"), 0.0, 0.504, 1.4),
            ranked(4, Some("drink"), 0.0, 0.600, 12.0),
        ];

        let outcome = cluster(&input, 2.0);
        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.clusters[0].members.len(), 3);
        assert_eq!(outcome.clusters[0].tag_slug, "drink");
        assert_eq!(outcome.clusters[0].representative_km, 1.0);

        // The far one fails the radius check against the reference point
        assert_eq!(outcome.solos.len(), 1);
        assert_eq!(outcome.solos[0].poi.id, 4);
    }

    #[test]
    fn test_singleton_group_demoted_to_solo() {
        let input = vec![
            ranked(1, Some("food"), 0.0, 0.5, 1.0),
            ranked(2, Some("drink"), 0.0, 0.501, 1.1),
        ];

        let outcome = cluster(&input, 2.0);
        assert!(outcome.clusters.is_empty());
        assert_eq!(outcome.solos.len(), 2);
    }

    #[test]
    fn test_untagged_is_solo() {
        let input = vec![
            ranked(1, None, 0.0, 0.5, 1.0),
            ranked(2, Some("food"), 0.0, 0.501, 1.1),
            ranked(3, Some("food"), 0.0, 0.502, 1.2),
        ];

        let outcome = cluster(&input, 2.0);
        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.solos.len(), 1);
        assert_eq!(outcome.solos[0].poi.id, 1);
    }

    #[test]
    fn test_merged_ordering() {
        let input = vec![
            ranked(1, None, 0.0, 0.1, 0.5),
            ranked(2, Some("food"), 0.0, 0.501, 1.1),
            ranked(3, Some("food"), 0.0, 0.502, 1.2),
            ranked(4, None, 0.0, 0.9, 3.0),
        ];

        let entries = merge(cluster(&input, 2.0));
        let labels: Vec<&str> = entries.iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["poi-1", "FOOD", "poi-4"]);
        assert_eq!(entries[1].poi_count(), 2);
        // Ascending by representative distance
        assert!(entries[0].distance_km() <= entries[1].distance_km());
        assert!(entries[1].distance_km() <= entries[2].distance_km());
    }
}
