//! Helpers to convert domain data into egui-facing view structs.

use crate::map_scene::truncate_chars;
use crate::model::{AnalysisResult, TagCandidate};
use crate::result_index::ResultIndex;
use crate::selection::SelectionSet;

/// Characters kept in a selected-point excerpt.
const EXCERPT_LIMIT: usize = 50;

/// Display row for one tag candidate. `index` points back into the
/// unfiltered candidate list so edits hit the right entry.
#[derive(Clone, Debug, PartialEq)]
pub struct TagRow {
    /// Position in the editor's candidate list.
    pub index: usize,
    /// Tag text.
    pub text: String,
    /// Category, if any.
    pub category: Option<String>,
    /// Salience score.
    pub score: f64,
    /// Occurrence count.
    pub count: u32,
}

/// Rows matching a case-insensitive search over text and category.
pub fn filtered_tag_rows(candidates: &[TagCandidate], query: &str) -> Vec<TagRow> {
    let needle = query.trim().to_lowercase();
    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| {
            needle.is_empty()
                || candidate.text.to_lowercase().contains(&needle)
                || candidate
                    .category
                    .as_ref()
                    .is_some_and(|category| category.to_lowercase().contains(&needle))
        })
        .map(|(index, candidate)| TagRow {
            index,
            text: candidate.text.clone(),
            category: candidate.category.clone(),
            score: candidate.score,
            count: candidate.count,
        })
        .collect()
}

/// Card shown in the selected-points side panel.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedPointCard {
    /// Point identity, rendered as text.
    pub id: String,
    /// Truncated text excerpt.
    pub excerpt: String,
    /// Comma-joined tag list.
    pub tags: String,
}

/// Cards for every selected point that still resolves in the result, in
/// selection order.
pub fn selected_point_cards(index: &ResultIndex, selection: &SelectionSet) -> Vec<SelectedPointCard> {
    selection
        .iter()
        .filter_map(|id| index.point(id))
        .map(|point| SelectedPointCard {
            id: point.id.to_string(),
            excerpt: truncate_chars(&point.text, EXCERPT_LIMIT),
            tags: point.tags.join(", "),
        })
        .collect()
}

/// Counters for the stats block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultStats {
    /// Total data points.
    pub points: usize,
    /// Distinct clusters in the mapping.
    pub clusters: usize,
    /// Distinct tags across the result.
    pub tags: usize,
}

/// Summarize a result for the stats block.
pub fn result_stats(result: &AnalysisResult) -> ResultStats {
    ResultStats {
        points: result.data_points.len(),
        clusters: result.clusters.len(),
        tags: result.tags.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataPoint, PointId};
    use std::collections::BTreeMap;
    use std::rc::Rc;

    fn candidates() -> Vec<TagCandidate> {
        vec![
            TagCandidate {
                text: "残業".to_string(),
                score: 0.8,
                category: Some("組織".to_string()),
                count: 3,
            },
            TagCandidate {
                text: "研修".to_string(),
                score: 0.5,
                category: Some("人事".to_string()),
                count: 2,
            },
        ]
    }

    #[test]
    fn empty_query_lists_everything() {
        let rows = filtered_tag_rows(&candidates(), "");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 0);
    }

    #[test]
    fn query_matches_text_or_category() {
        let rows = filtered_tag_rows(&candidates(), "残業");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "残業");
        let rows = filtered_tag_rows(&candidates(), "人事");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 1);
    }

    #[test]
    fn cards_follow_selection_order_and_skip_unknown_ids() {
        let result = AnalysisResult {
            data_points: vec![
                DataPoint {
                    id: PointId::from(0),
                    text: "あ".repeat(80),
                    x: 0.0,
                    y: 0.0,
                    cluster_id: 0,
                    tags: vec!["残業".to_string()],
                    group: None,
                    metadata: serde_json::Map::new(),
                },
                DataPoint {
                    id: PointId::from(1),
                    text: "short".to_string(),
                    x: 1.0,
                    y: 1.0,
                    cluster_id: 0,
                    tags: vec![],
                    group: None,
                    metadata: serde_json::Map::new(),
                },
            ],
            clusters: BTreeMap::new(),
            tags: vec!["残業".to_string()],
            config: serde_json::Map::new(),
        };
        let index = ResultIndex::new(Rc::new(result));
        let mut selection = SelectionSet::new();
        selection.toggle(&PointId::from(1));
        selection.toggle(&PointId::from(99));
        selection.toggle(&PointId::from(0));
        let cards = selected_point_cards(&index, &selection);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, "1");
        assert_eq!(cards[0].excerpt, "short");
        assert_eq!(cards[1].excerpt, format!("{}...", "あ".repeat(50)));
        assert_eq!(cards[1].tags, "残業");
    }

    #[test]
    fn stats_count_points_clusters_tags() {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            0,
            crate::model::Cluster {
                size: 1,
                top_tags: vec![],
                center_x: 0.0,
                center_y: 0.0,
            },
        );
        let result = AnalysisResult {
            data_points: Vec::new(),
            clusters,
            tags: vec!["A".to_string(), "B".to_string()],
            config: serde_json::Map::new(),
        };
        assert_eq!(
            result_stats(&result),
            ResultStats {
                points: 0,
                clusters: 1,
                tags: 2
            }
        );
    }
}
