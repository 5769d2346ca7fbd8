//! Wire and domain types shared with the analysis backend.
//!
//! Everything here mirrors the JSON the collaborators speak. The structs are
//! read-only once received; derived views live in [`crate::result_index`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column name sent to the backend when an upload carries no columns at all.
pub const FALLBACK_TEXT_COLUMN: &str = "自由記述";

/// Category assigned to tag rules whose candidate had none.
pub const DEFAULT_TAG_CATEGORY: &str = "その他";

/// Point identity as the backend emits it: either a string or an integer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Numeric id, typically a row index.
    Number(i64),
    /// String id taken from an id column.
    Text(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Number(n) => write!(f, "{n}"),
            PointId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PointId {
    fn from(value: i64) -> Self {
        PointId::Number(value)
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        PointId::Text(value.to_string())
    }
}

/// One row of the survey after embedding and projection.
///
/// Immutable once received from the analysis service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unique identity within one result.
    pub id: PointId,
    /// Free-text answer this point was derived from.
    pub text: String,
    /// Projected x coordinate (unbounded).
    pub x: f64,
    /// Projected y coordinate (unbounded).
    pub y: f64,
    /// Cluster label; [`NOISE_CLUSTER_ID`] means unclustered.
    pub cluster_id: i32,
    /// Tags matched against this point's text.
    pub tags: Vec<String>,
    /// Optional group label from the group column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Free-form extra fields the backend may attach.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Cluster id the upstream engine reserves for noise/unclustered points.
pub const NOISE_CLUSTER_ID: i32 = -1;

/// Summary of one cluster, computed upstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Number of member points.
    pub size: usize,
    /// Most frequent tags among members, ordered by frequency.
    pub top_tags: Vec<String>,
    /// Mean x coordinate of the members.
    pub center_x: f64,
    /// Mean y coordinate of the members.
    pub center_y: f64,
}

/// Complete output of one analysis run; the single source of truth for a
/// visualization session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Every projected point.
    pub data_points: Vec<DataPoint>,
    /// Cluster summaries keyed by cluster id. The noise id may be absent.
    pub clusters: BTreeMap<i32, Cluster>,
    /// Distinct tags observed across all points.
    pub tags: Vec<String>,
    /// Configuration echoed back by the backend.
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

/// Tag suggestion extracted by the upload service, editable by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagCandidate {
    /// Tag text.
    pub text: String,
    /// Salience score; higher means more salient, unbounded.
    pub score: f64,
    /// Optional category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Occurrence count in the uploaded data.
    #[serde(default = "default_candidate_count")]
    pub count: u32,
}

fn default_candidate_count() -> u32 {
    1
}

impl TagCandidate {
    /// Build a hand-entered candidate the way the tag editor creates one.
    pub fn manual(text: impl Into<String>, category: Option<String>) -> Self {
        Self {
            text: text.into(),
            score: 0.0,
            category,
            count: 1,
        }
    }
}

/// User-confirmed tag mapping sent to the analysis engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagRule {
    /// Canonical tag key.
    pub key: String,
    /// Synonyms matched against the text; always contains the key itself.
    pub synonyms: Vec<String>,
    /// Category, defaulted to [`DEFAULT_TAG_CATEGORY`] when the candidate
    /// had none.
    pub category: String,
}

impl TagRule {
    /// Convert an edited candidate into the rule the backend expects.
    pub fn from_candidate(candidate: &TagCandidate) -> Self {
        Self {
            key: candidate.text.clone(),
            synonyms: vec![candidate.text.clone()],
            category: candidate
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_TAG_CATEGORY.to_string()),
        }
    }
}

/// Which uploaded columns feed the analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column holding the free text. Required.
    pub text_column: String,
    /// Optional id column; empty means row indices are used.
    pub id_column: String,
    /// Optional group column; empty means no grouping.
    pub group_column: String,
}

/// Clustering algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMethod {
    /// Density-based, variable cluster count. The default.
    #[default]
    Hdbscan,
    /// Fixed cluster count.
    Kmeans,
    /// Density-based with a fixed radius.
    Dbscan,
}

impl ClusterMethod {
    /// All supported methods, in display order.
    pub const ALL: [ClusterMethod; 3] = [
        ClusterMethod::Hdbscan,
        ClusterMethod::Kmeans,
        ClusterMethod::Dbscan,
    ];

    /// Wire/display name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterMethod::Hdbscan => "hdbscan",
            ClusterMethod::Kmeans => "kmeans",
            ClusterMethod::Dbscan => "dbscan",
        }
    }
}

/// HDBSCAN parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HdbscanParams {
    /// Minimum size for a group to count as a cluster.
    pub min_cluster_size: u32,
    /// Minimum neighborhood size for a core point.
    pub min_samples: u32,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 15,
            min_samples: 5,
        }
    }
}

/// K-means parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KmeansParams {
    /// Number of clusters to produce.
    pub n_clusters: u32,
}

impl Default for KmeansParams {
    fn default() -> Self {
        Self { n_clusters: 8 }
    }
}

/// UMAP projection parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UmapParams {
    /// Neighborhood size balancing local versus global structure.
    pub n_neighbors: u32,
    /// Minimum distance between embedded points.
    pub min_dist: f64,
    /// Seed for reproducible layouts.
    pub random_state: u64,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            random_state: 42,
        }
    }
}

/// Request sent to the analyze collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Column roles.
    pub column_mapping: ColumnMapping,
    /// Finalized tag rules.
    pub tag_rules: Vec<TagRule>,
    /// Selected clustering method.
    pub cluster_method: ClusterMethod,
    /// HDBSCAN parameters, sent regardless of the selected method.
    #[serde(default)]
    pub hdbscan_params: HdbscanParams,
    /// K-means parameters, sent regardless of the selected method.
    #[serde(default)]
    pub kmeans_params: KmeansParams,
    /// UMAP parameters.
    #[serde(default)]
    pub umap_params: UmapParams,
    /// Optional mask shaping the projected layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_mask_path: Option<String>,
}

/// Response from the upload collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether parsing succeeded.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// Column names found in the file.
    pub columns: Vec<String>,
    /// First few rows, for preview.
    #[serde(default)]
    pub sample_data: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Auto-extracted tag suggestions.
    #[serde(default)]
    pub tag_candidates: Vec<TagCandidate>,
}
