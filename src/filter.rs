//! Multi-criterion point filtering for the map view.
//!
//! Filtering is a pure function of the point slice and the filter state so
//! the UI can re-apply it on every change without accumulating drift.

use std::collections::BTreeSet;

use crate::model::DataPoint;

/// Active view filter: a tag set (OR across tags) and an optional single
/// cluster restriction. Both compose by intersection.
///
/// Derived state; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    tags: BTreeSet<String>,
    cluster: Option<i32>,
}

impl FilterState {
    /// Filter that lets every point pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected tags; empty means no tag filter.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Selected cluster, if any.
    pub fn cluster(&self) -> Option<i32> {
        self.cluster
    }

    /// True when no criterion is active.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.cluster.is_none()
    }

    /// True when the tag participates in the tag filter.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Add the tag if absent, remove it if present.
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }

    /// Replace the cluster restriction. `None` clears it.
    pub fn set_cluster(&mut self, cluster: Option<i32>) {
        self.cluster = cluster;
    }

    /// Drop every criterion. Selection state is untouched by design; see
    /// [`crate::selection::SelectionSet`].
    pub fn clear(&mut self) {
        self.tags.clear();
        self.cluster = None;
    }

    /// True when the point passes both the tag filter and the cluster
    /// filter.
    pub fn matches(&self, point: &DataPoint) -> bool {
        self.matches_tags(point) && self.matches_cluster(point)
    }

    fn matches_tags(&self, point: &DataPoint) -> bool {
        self.tags.is_empty() || point.tags.iter().any(|tag| self.tags.contains(tag))
    }

    fn matches_cluster(&self, point: &DataPoint) -> bool {
        self.cluster.is_none_or(|id| point.cluster_id == id)
    }
}

/// Apply the filter, preserving input order. Identical inputs always yield
/// identical output.
pub fn apply<'a>(points: &'a [DataPoint], filter: &FilterState) -> Vec<&'a DataPoint> {
    points.iter().filter(|point| filter.matches(point)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointId;

    fn point(id: i64, cluster_id: i32, tags: &[&str]) -> DataPoint {
        DataPoint {
            id: PointId::Number(id),
            text: format!("point {id}"),
            x: id as f64,
            y: -(id as f64),
            cluster_id,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            group: None,
            metadata: serde_json::Map::new(),
        }
    }

    fn sample_points() -> Vec<DataPoint> {
        vec![
            point(0, 0, &["A"]),
            point(1, 0, &["B"]),
            point(2, 1, &["A", "B"]),
            point(3, 1, &[]),
            point(4, -1, &["C"]),
        ]
    }

    fn ids(filtered: &[&DataPoint]) -> Vec<i64> {
        filtered
            .iter()
            .map(|p| match &p.id {
                PointId::Number(n) => *n,
                PointId::Text(_) => panic!("numeric ids expected"),
            })
            .collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let points = sample_points();
        let filtered = apply(&points, &FilterState::new());
        assert_eq!(ids(&filtered), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cluster_filter_keeps_members_in_source_order() {
        let points = sample_points();
        let mut filter = FilterState::new();
        filter.set_cluster(Some(0));
        assert_eq!(ids(&apply(&points, &filter)), vec![0, 1]);
    }

    #[test]
    fn tag_filter_is_or_across_tags() {
        let points = sample_points();
        let mut filter = FilterState::new();
        filter.toggle_tag("A");
        filter.toggle_tag("B");
        assert_eq!(ids(&apply(&points, &filter)), vec![0, 1, 2]);
    }

    #[test]
    fn tag_and_cluster_compose_by_intersection() {
        let points = sample_points();
        let mut filter = FilterState::new();
        filter.toggle_tag("A");
        filter.set_cluster(Some(1));
        assert_eq!(ids(&apply(&points, &filter)), vec![2]);
    }

    #[test]
    fn apply_is_idempotent() {
        let points = sample_points();
        let mut filter = FilterState::new();
        filter.toggle_tag("A");
        filter.set_cluster(Some(1));
        let once = ids(&apply(&points, &filter));
        let twice = ids(&apply(&points, &filter));
        assert_eq!(once, twice);
    }

    #[test]
    fn point_passes_iff_it_passes_each_criterion() {
        let points = sample_points();
        let mut filter = FilterState::new();
        filter.toggle_tag("A");
        filter.set_cluster(Some(1));
        let tag_only = {
            let mut f = FilterState::new();
            f.toggle_tag("A");
            f
        };
        let cluster_only = {
            let mut f = FilterState::new();
            f.set_cluster(Some(1));
            f
        };
        let combined = apply(&points, &filter);
        for p in &points {
            let expected = tag_only.matches(p) && cluster_only.matches(p);
            assert_eq!(combined.iter().any(|kept| kept.id == p.id), expected);
        }
    }

    #[test]
    fn toggle_tag_twice_restores_the_filter() {
        let mut filter = FilterState::new();
        filter.toggle_tag("A");
        filter.toggle_tag("A");
        assert!(filter.is_empty());
    }

    #[test]
    fn clear_drops_both_criteria() {
        let mut filter = FilterState::new();
        filter.toggle_tag("A");
        filter.set_cluster(Some(2));
        filter.clear();
        assert!(filter.is_empty());
    }

    #[test]
    fn noise_cluster_is_filterable_like_any_other() {
        let points = sample_points();
        let mut filter = FilterState::new();
        filter.set_cluster(Some(-1));
        assert_eq!(ids(&apply(&points, &filter)), vec![4]);
    }
}
