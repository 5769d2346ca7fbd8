//! Lookup views over a finished [`AnalysisResult`].
//!
//! The index shares the result via `Rc` instead of copying point payloads.
//! It is rebuilt wholesale whenever a new result arrives; there is no
//! partial update path.

use std::collections::HashMap;
use std::rc::Rc;

use crate::model::{AnalysisResult, Cluster, DataPoint, PointId};

/// Derived lookups: identity → point, cluster id → members, tag → ids.
#[derive(Clone, Debug)]
pub struct ResultIndex {
    result: Rc<AnalysisResult>,
    by_id: HashMap<PointId, usize>,
    by_cluster: Vec<(i32, Vec<usize>)>,
    by_tag: HashMap<String, Vec<PointId>>,
}

impl ResultIndex {
    /// Build every view in one pass over the points. An empty result yields
    /// empty views.
    pub fn new(result: Rc<AnalysisResult>) -> Self {
        let mut by_id = HashMap::with_capacity(result.data_points.len());
        let mut by_cluster: Vec<(i32, Vec<usize>)> = Vec::new();
        let mut by_tag: HashMap<String, Vec<PointId>> = HashMap::new();
        for (index, point) in result.data_points.iter().enumerate() {
            by_id.insert(point.id.clone(), index);
            match by_cluster
                .iter_mut()
                .find(|(cluster_id, _)| *cluster_id == point.cluster_id)
            {
                Some((_, members)) => members.push(index),
                None => by_cluster.push((point.cluster_id, vec![index])),
            }
            for tag in &point.tags {
                by_tag
                    .entry(tag.clone())
                    .or_default()
                    .push(point.id.clone());
            }
        }
        Self {
            result,
            by_id,
            by_cluster,
            by_tag,
        }
    }

    /// The indexed result.
    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    /// Shared handle to the indexed result.
    pub fn result_rc(&self) -> Rc<AnalysisResult> {
        Rc::clone(&self.result)
    }

    /// Look up a point by identity.
    pub fn point(&self, id: &PointId) -> Option<&DataPoint> {
        self.by_id
            .get(id)
            .and_then(|&index| self.result.data_points.get(index))
    }

    /// Cluster summary for an id, if the mapping has one. A missing entry is
    /// tolerated; callers treat the centroid as absent.
    pub fn cluster(&self, cluster_id: i32) -> Option<&Cluster> {
        self.result.clusters.get(&cluster_id)
    }

    /// Member points of a cluster in source order. Unknown ids yield an
    /// empty iterator.
    pub fn cluster_members(&self, cluster_id: i32) -> impl Iterator<Item = &DataPoint> {
        self.by_cluster
            .iter()
            .find(|(id, _)| *id == cluster_id)
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&index| self.result.data_points.get(index))
    }

    /// Cluster ids in order of first appearance among the points.
    pub fn cluster_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_cluster.iter().map(|(id, _)| *id)
    }

    /// Identities of the points carrying a tag, in source order.
    pub fn points_with_tag(&self, tag: &str) -> &[PointId] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }
}
