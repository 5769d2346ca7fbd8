//! Turns filtered points and cluster summaries into a drawable scene.
//!
//! The scene is plain data: cluster-colored point groups plus centroid
//! markers, with tooltip and click resolution keyed by item identity. The
//! egui canvas consumes it without knowing anything about filtering, so the
//! whole contract is testable without a rendering surface.

use std::collections::BTreeMap;

use egui::Color32;

use crate::model::{Cluster, DataPoint, NOISE_CLUSTER_ID, PointId};
use crate::result_index::ResultIndex;
use crate::selection::SelectionSet;

/// Fixed point palette; cluster colors are assigned by
/// `cluster_id mod palette_len` so they survive re-filtering.
pub const CLUSTER_PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x3b, 0x82, 0xf6),
    Color32::from_rgb(0xef, 0x44, 0x44),
    Color32::from_rgb(0x10, 0xb9, 0x81),
    Color32::from_rgb(0xf5, 0x9e, 0x0b),
    Color32::from_rgb(0x8b, 0x5c, 0xf6),
    Color32::from_rgb(0x06, 0xb6, 0xd4),
    Color32::from_rgb(0x84, 0xcc, 0x16),
    Color32::from_rgb(0xf9, 0x73, 0x16),
    Color32::from_rgb(0xec, 0x48, 0x99),
    Color32::from_rgb(0x63, 0x66, 0xf1),
];

/// Longest tooltip excerpt of a point's text, in characters.
pub const TOOLTIP_TEXT_LIMIT: usize = 100;

/// Stable color for a cluster id. `rem_euclid` keeps the noise id (−1) on a
/// fixed palette slot too.
pub fn cluster_color(cluster_id: i32) -> Color32 {
    let slot = cluster_id.rem_euclid(CLUSTER_PALETTE.len() as i32) as usize;
    CLUSTER_PALETTE[slot]
}

/// Identity of something drawn on the map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SceneItemId {
    /// A data point.
    Point(PointId),
    /// A cluster centroid marker.
    Centroid(i32),
}

/// Position of one drawable point.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenePoint {
    /// Identity of the underlying data point.
    pub id: PointId,
    /// World x.
    pub x: f64,
    /// World y.
    pub y: f64,
}

/// All points of one cluster that survived the filter.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterGroup {
    /// Cluster id shared by the members.
    pub cluster_id: i32,
    /// Legend label.
    pub label: String,
    /// Stable cluster color.
    pub color: Color32,
    /// Members in filtered (source) order.
    pub points: Vec<ScenePoint>,
}

/// Anchor marker at a cluster's upstream-computed centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct CentroidMarker {
    /// Cluster the marker belongs to.
    pub cluster_id: i32,
    /// World x of the centroid.
    pub x: f64,
    /// World y of the centroid.
    pub y: f64,
    /// Matches the cluster's point color.
    pub color: Color32,
    /// Short label drawn next to the marker.
    pub label: String,
}

/// Axis-aligned world extent of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBounds {
    /// Smallest x.
    pub min_x: f64,
    /// Largest x.
    pub max_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest y.
    pub max_y: f64,
}

/// Drawable output of one build: groups plus centroid markers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapScene {
    /// One group per distinct cluster id in the filtered points, ascending
    /// by id (noise first).
    pub groups: Vec<ClusterGroup>,
    /// One marker per cluster in the unfiltered mapping, so an anchor stays
    /// visible even when a filter removes all of its members.
    pub centroids: Vec<CentroidMarker>,
}

impl MapScene {
    /// Group filtered points by cluster and lay centroid markers from the
    /// full cluster mapping.
    pub fn build(filtered: &[&DataPoint], clusters: &BTreeMap<i32, Cluster>) -> Self {
        let mut grouped: BTreeMap<i32, Vec<ScenePoint>> = BTreeMap::new();
        for point in filtered {
            grouped.entry(point.cluster_id).or_default().push(ScenePoint {
                id: point.id.clone(),
                x: point.x,
                y: point.y,
            });
        }
        let groups = grouped
            .into_iter()
            .map(|(cluster_id, points)| ClusterGroup {
                cluster_id,
                label: group_label(cluster_id),
                color: cluster_color(cluster_id),
                points,
            })
            .collect();
        let centroids = clusters
            .iter()
            .filter(|(_, cluster)| cluster.size > 0)
            .map(|(&cluster_id, cluster)| CentroidMarker {
                cluster_id,
                x: cluster.center_x,
                y: cluster.center_y,
                color: cluster_color(cluster_id),
                label: format!("C{cluster_id}"),
            })
            .collect();
        Self { groups, centroids }
    }

    /// Total number of drawable points across all groups.
    pub fn point_count(&self) -> usize {
        self.groups.iter().map(|group| group.points.len()).sum()
    }

    /// World extent covering every point and centroid; `None` for an empty
    /// scene.
    pub fn bounds(&self) -> Option<SceneBounds> {
        let xs_ys = self
            .groups
            .iter()
            .flat_map(|group| group.points.iter().map(|p| (p.x, p.y)))
            .chain(self.centroids.iter().map(|c| (c.x, c.y)));
        let mut bounds: Option<SceneBounds> = None;
        for (x, y) in xs_ys {
            let entry = bounds.get_or_insert(SceneBounds {
                min_x: x,
                max_x: x,
                min_y: y,
                max_y: y,
            });
            entry.min_x = entry.min_x.min(x);
            entry.max_x = entry.max_x.max(x);
            entry.min_y = entry.min_y.min(y);
            entry.max_y = entry.max_y.max(y);
        }
        bounds
    }
}

fn group_label(cluster_id: i32) -> String {
    if cluster_id == NOISE_CLUSTER_ID {
        "Noise".to_string()
    } else {
        format!("Cluster {cluster_id}")
    }
}

/// Owns the current scene and rebuilds it when its inputs change.
///
/// A rebuild replaces the previous scene wholesale, so two scenes for the
/// same view never coexist.
#[derive(Debug, Default)]
pub struct MapRenderer {
    scene: Option<MapScene>,
    fingerprint: Option<(usize, crate::filter::FilterState)>,
}

impl MapRenderer {
    /// Renderer with no scene yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the scene for the given result and filter, rebuilding only
    /// when either changed since the last call.
    pub fn scene(
        &mut self,
        index: &ResultIndex,
        filter: &crate::filter::FilterState,
    ) -> &MapScene {
        let fingerprint = (result_addr(index), filter.clone());
        if self.fingerprint.as_ref() != Some(&fingerprint) {
            self.scene = None;
            self.fingerprint = Some(fingerprint);
        }
        self.scene.get_or_insert_with(|| {
            let filtered = crate::filter::apply(&index.result().data_points, filter);
            MapScene::build(&filtered, &index.result().clusters)
        })
    }

    /// Drop the cached scene, forcing a rebuild on next access. Called when
    /// a new result supersedes the current view.
    pub fn invalidate(&mut self) {
        self.scene = None;
        self.fingerprint = None;
    }

    /// Tooltip body for a rendered item: cluster summary for a centroid,
    /// truncated text plus tags for a point. `None` when the item no longer
    /// resolves (tolerated data inconsistency).
    pub fn tooltip(index: &ResultIndex, item: &SceneItemId) -> Option<String> {
        match item {
            SceneItemId::Centroid(cluster_id) => {
                let cluster = index.cluster(*cluster_id)?;
                Some(format!(
                    "Cluster {cluster_id} center\nSize: {} points\nTop tags: {}",
                    cluster.size,
                    cluster.top_tags.join(", ")
                ))
            }
            SceneItemId::Point(id) => {
                let point = index.point(id)?;
                Some(format!(
                    "ID: {id}\n{}\nTags: {}",
                    truncate_chars(&point.text, TOOLTIP_TEXT_LIMIT),
                    point.tags.join(", ")
                ))
            }
        }
    }

    /// Apply a click: data points toggle selection, centroid clicks are
    /// no-ops. Returns true when the selection changed.
    pub fn handle_click(item: &SceneItemId, selection: &mut SelectionSet) -> bool {
        match item {
            SceneItemId::Point(id) => {
                selection.toggle(id);
                true
            }
            SceneItemId::Centroid(_) => false,
        }
    }
}

fn result_addr(index: &ResultIndex) -> usize {
    std::rc::Rc::as_ptr(&index.result_rc()) as usize
}

/// Cut `text` to at most `limit` characters, appending an ellipsis marker
/// when something was removed. Counts characters, not bytes.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(limit) {
        None => text.to_string(),
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
    }
}
