//! Four-stage wizard sequencing the upload → tags → analysis →
//! visualization flow.
//!
//! The controller is a strict state machine: each forward transition
//! requires the previous stage's payload, `back` always succeeds, and a
//! failed collaborator call leaves the stage untouched. Each payload is
//! owned by the stage that produced it (Upload owns the upload response,
//! Tags owns the tag rules and the synthesized request, Analysis owns the
//! result), so backing up to stage S discards everything produced after S.

use std::rc::Rc;

use crate::model::{
    AnalysisRequest, AnalysisResult, ColumnMapping, FALLBACK_TEXT_COLUMN, TagCandidate, TagRule,
    UploadResponse,
};

/// Wizard stages in forward order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Waiting for a parsed upload.
    #[default]
    Upload,
    /// Editing tag candidates.
    Tags,
    /// Reviewing the analysis request.
    Analysis,
    /// Exploring the clustering map.
    Visualization,
}

impl Stage {
    /// All stages, in order, for the progress header.
    pub const ALL: [Stage; 4] = [
        Stage::Upload,
        Stage::Tags,
        Stage::Analysis,
        Stage::Visualization,
    ];

    /// Stage reached by a back action, if any.
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Stage::Upload => None,
            Stage::Tags => Some(Stage::Upload),
            Stage::Analysis => Some(Stage::Tags),
            Stage::Visualization => Some(Stage::Analysis),
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Upload => "Upload",
            Stage::Tags => "Tags",
            Stage::Analysis => "Analysis",
            Stage::Visualization => "Visualization",
        }
    }
}

/// Why a transition was refused. The stage never changes on error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    /// The operation belongs to a different stage.
    #[error("Expected stage {expected:?}, currently in {actual:?}")]
    WrongStage {
        /// Stage the operation is valid in.
        expected: Stage,
        /// Stage the wizard is actually in.
        actual: Stage,
    },
    /// The upload collaborator reported failure.
    #[error("Upload failed: {0}")]
    UploadRejected(String),
    /// The request cannot be submitted without a text column.
    #[error("No text column selected")]
    MissingTextColumn,
}

/// Owns the current stage and every stage payload.
#[derive(Clone, Debug, Default)]
pub struct WizardController {
    stage: Stage,
    upload: Option<UploadResponse>,
    tag_rules: Option<Vec<TagRule>>,
    request: Option<AnalysisRequest>,
    result: Option<Rc<AnalysisResult>>,
}

impl WizardController {
    /// Fresh wizard at the Upload stage with no payloads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stored upload response, present from the Tags stage onward.
    pub fn upload(&self) -> Option<&UploadResponse> {
        self.upload.as_ref()
    }

    /// Finalized tag rules, present from the Analysis stage onward.
    pub fn tag_rules(&self) -> Option<&[TagRule]> {
        self.tag_rules.as_deref()
    }

    /// Synthesized request, present from the Analysis stage onward.
    pub fn request(&self) -> Option<&AnalysisRequest> {
        self.request.as_ref()
    }

    /// Mutable request for parameter editing in the Analysis stage.
    pub fn request_mut(&mut self) -> Option<&mut AnalysisRequest> {
        self.request.as_mut()
    }

    /// Stored analysis result, present in the Visualization stage.
    pub fn result(&self) -> Option<&Rc<AnalysisResult>> {
        self.result.as_ref()
    }

    /// Store a successful upload response and advance Upload → Tags.
    ///
    /// An unsuccessful response is refused without advancing, per the
    /// failure semantics of forward transitions.
    pub fn complete_upload(&mut self, response: UploadResponse) -> Result<(), WizardError> {
        self.expect_stage(Stage::Upload)?;
        if !response.success {
            return Err(WizardError::UploadRejected(response.message));
        }
        self.upload = Some(response);
        self.stage = Stage::Tags;
        Ok(())
    }

    /// Convert the edited candidates 1:1 into tag rules, synthesize the
    /// default request, and advance Tags → Analysis.
    pub fn finalize_tags(&mut self, candidates: &[TagCandidate]) -> Result<(), WizardError> {
        self.expect_stage(Stage::Tags)?;
        let upload = self.upload.as_ref().ok_or(WizardError::WrongStage {
            expected: Stage::Tags,
            actual: Stage::Upload,
        })?;
        let rules: Vec<TagRule> = candidates.iter().map(TagRule::from_candidate).collect();
        self.request = Some(default_request(upload, rules.clone()));
        self.tag_rules = Some(rules);
        self.stage = Stage::Analysis;
        Ok(())
    }

    /// Check the request can be submitted. A blank text column is an error,
    /// never silently defaulted here.
    pub fn validate_request(&self) -> Result<(), WizardError> {
        let request = self.request.as_ref().ok_or(WizardError::WrongStage {
            expected: Stage::Analysis,
            actual: self.stage(),
        })?;
        if request.column_mapping.text_column.trim().is_empty() {
            return Err(WizardError::MissingTextColumn);
        }
        Ok(())
    }

    /// Store a finished result and advance Analysis → Visualization.
    pub fn complete_analysis(&mut self, result: AnalysisResult) -> Result<(), WizardError> {
        self.expect_stage(Stage::Analysis)?;
        self.result = Some(Rc::new(result));
        self.stage = Stage::Visualization;
        Ok(())
    }

    /// Move to the predecessor stage. Keeps payloads up to and including
    /// the new stage's own, discards everything produced later. Returns
    /// false when already at Upload.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.stage().predecessor() else {
            return false;
        };
        self.stage = previous;
        if previous < Stage::Analysis {
            self.result = None;
        }
        if previous < Stage::Tags {
            self.tag_rules = None;
            self.request = None;
        }
        true
    }

    /// Return to Upload and discard every payload.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), WizardError> {
        let actual = self.stage();
        if actual != expected {
            return Err(WizardError::WrongStage { expected, actual });
        }
        Ok(())
    }
}

/// Default request synthesized at the Tags → Analysis transition: first
/// uploaded column as the text column (no name-based detection), empty
/// id/group columns, density-based clustering with fixed parameters.
fn default_request(upload: &UploadResponse, tag_rules: Vec<TagRule>) -> AnalysisRequest {
    let text_column = upload
        .columns
        .first()
        .cloned()
        .unwrap_or_else(|| FALLBACK_TEXT_COLUMN.to_string());
    AnalysisRequest {
        column_mapping: ColumnMapping {
            text_column,
            id_column: String::new(),
            group_column: String::new(),
        },
        tag_rules,
        ..AnalysisRequest::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterMethod, DEFAULT_TAG_CATEGORY};

    fn upload_response(columns: &[&str]) -> UploadResponse {
        UploadResponse {
            success: true,
            message: "parsed".to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            sample_data: Vec::new(),
            tag_candidates: vec![TagCandidate {
                text: "残業".to_string(),
                score: 0.8,
                category: None,
                count: 3,
            }],
        }
    }

    fn wizard_at_tags() -> WizardController {
        let mut wizard = WizardController::new();
        wizard
            .complete_upload(upload_response(&["id", "free_text"]))
            .unwrap();
        wizard
    }

    #[test]
    fn starts_at_upload_with_no_payloads() {
        let wizard = WizardController::new();
        assert_eq!(wizard.stage(), Stage::Upload);
        assert!(wizard.upload().is_none());
        assert!(wizard.tag_rules().is_none());
        assert!(wizard.request().is_none());
        assert!(wizard.result().is_none());
    }

    #[test]
    fn stages_cannot_be_skipped() {
        let mut wizard = WizardController::new();
        let candidates = [TagCandidate::manual("残業", None)];
        assert!(matches!(
            wizard.finalize_tags(&candidates),
            Err(WizardError::WrongStage { .. })
        ));
        assert!(matches!(
            wizard.complete_analysis(AnalysisResult::default()),
            Err(WizardError::WrongStage { .. })
        ));
        assert_eq!(wizard.stage(), Stage::Upload);
        assert!(wizard.request().is_none());
        assert!(wizard.result().is_none());
    }

    #[test]
    fn failed_upload_does_not_advance() {
        let mut wizard = WizardController::new();
        let mut response = upload_response(&["id"]);
        response.success = false;
        response.message = "unreadable file".to_string();
        let err = wizard.complete_upload(response).unwrap_err();
        assert_eq!(
            err,
            WizardError::UploadRejected("unreadable file".to_string())
        );
        assert_eq!(wizard.stage(), Stage::Upload);
        assert!(wizard.upload().is_none());
    }

    #[test]
    fn finalize_tags_converts_candidates_one_to_one() {
        let mut wizard = wizard_at_tags();
        let candidates = wizard.upload().unwrap().tag_candidates.clone();
        wizard.finalize_tags(&candidates).unwrap();
        let rules = wizard.tag_rules().unwrap();
        assert_eq!(rules.len(), candidates.len());
        assert_eq!(rules[0].key, "残業");
        assert_eq!(rules[0].synonyms, vec!["残業".to_string()]);
        assert_eq!(rules[0].category, DEFAULT_TAG_CATEGORY);
    }

    #[test]
    fn default_request_uses_first_column_without_detection() {
        let mut wizard = wizard_at_tags();
        wizard.finalize_tags(&[]).unwrap();
        let request = wizard.request().unwrap();
        // First column wins even though "free_text" looks like the better
        // candidate; the mapping stage that guesses by name is bypassed.
        assert_eq!(request.column_mapping.text_column, "id");
        assert_eq!(request.column_mapping.id_column, "");
        assert_eq!(request.column_mapping.group_column, "");
        assert_eq!(request.cluster_method, ClusterMethod::Hdbscan);
        assert_eq!(request.hdbscan_params.min_cluster_size, 15);
        assert_eq!(request.hdbscan_params.min_samples, 5);
        assert_eq!(request.kmeans_params.n_clusters, 8);
        assert_eq!(request.umap_params.n_neighbors, 15);
        assert_eq!(request.umap_params.min_dist, 0.1);
        assert_eq!(request.umap_params.random_state, 42);
    }

    #[test]
    fn empty_column_list_falls_back_to_fixed_label() {
        let mut wizard = WizardController::new();
        wizard.complete_upload(upload_response(&[])).unwrap();
        wizard.finalize_tags(&[]).unwrap();
        assert_eq!(
            wizard.request().unwrap().column_mapping.text_column,
            FALLBACK_TEXT_COLUMN
        );
    }

    #[test]
    fn validation_rejects_blank_text_column() {
        let mut wizard = wizard_at_tags();
        wizard.finalize_tags(&[]).unwrap();
        wizard
            .request_mut()
            .unwrap()
            .column_mapping
            .text_column
            .clear();
        assert_eq!(
            wizard.validate_request(),
            Err(WizardError::MissingTextColumn)
        );
    }

    #[test]
    fn full_forward_walk_reaches_visualization() {
        let mut wizard = wizard_at_tags();
        wizard.finalize_tags(&[]).unwrap();
        assert_eq!(wizard.stage(), Stage::Analysis);
        wizard.validate_request().unwrap();
        wizard.complete_analysis(AnalysisResult::default()).unwrap();
        assert_eq!(wizard.stage(), Stage::Visualization);
        assert!(wizard.result().is_some());
    }

    #[test]
    fn back_keeps_earlier_payloads_and_drops_later_ones() {
        let mut wizard = wizard_at_tags();
        wizard.finalize_tags(&[]).unwrap();
        wizard.complete_analysis(AnalysisResult::default()).unwrap();

        assert!(wizard.back());
        assert_eq!(wizard.stage(), Stage::Analysis);
        assert!(wizard.result().is_some());

        assert!(wizard.back());
        assert_eq!(wizard.stage(), Stage::Tags);
        assert!(wizard.result().is_none());
        assert!(wizard.tag_rules().is_some());
        assert!(wizard.upload().is_some());

        assert!(wizard.back());
        assert_eq!(wizard.stage(), Stage::Upload);
        assert!(wizard.tag_rules().is_none());
        assert!(wizard.request().is_none());
        assert!(wizard.upload().is_some());

        assert!(!wizard.back());
    }

    #[test]
    fn reupload_after_back_starts_clean() {
        let mut wizard = wizard_at_tags();
        wizard.finalize_tags(&[]).unwrap();
        wizard.back();
        wizard.back();
        wizard
            .complete_upload(upload_response(&["free_text"]))
            .unwrap();
        assert_eq!(wizard.stage(), Stage::Tags);
        assert!(wizard.tag_rules().is_none());
        assert!(wizard.request().is_none());
        assert!(wizard.result().is_none());
    }

    #[test]
    fn reset_discards_everything() {
        let mut wizard = wizard_at_tags();
        wizard.finalize_tags(&[]).unwrap();
        wizard.complete_analysis(AnalysisResult::default()).unwrap();
        wizard.reset();
        assert_eq!(wizard.stage(), Stage::Upload);
        assert!(wizard.upload().is_none());
        assert!(wizard.tag_rules().is_none());
        assert!(wizard.request().is_none());
        assert!(wizard.result().is_none());
    }
}
