//! Maintains app state and bridges core logic to the egui UI.

use std::path::PathBuf;
use std::rc::Rc;

use crate::api::{ApiClient, ApiError};
use crate::egui_app::jobs::{ExportKind, JobMessage, Jobs};
use crate::egui_app::state::{StatusTone, UiState};
use crate::filter::FilterState;
use crate::map_scene::{MapRenderer, MapScene, SceneItemId};
use crate::model::{AnalysisRequest, AnalysisResult, TagCandidate, UploadResponse};
use crate::result_index::ResultIndex;
use crate::selection::SelectionSet;
use crate::wizard::{Stage, WizardController};

/// Owns the wizard, the map session state, and the collaborator jobs.
pub struct Controller {
    /// UI model consumed by the renderer.
    pub ui: UiState,
    api: ApiClient,
    jobs: Jobs,
    wizard: WizardController,
    index: Option<ResultIndex>,
    filter: FilterState,
    selection: SelectionSet,
    renderer: MapRenderer,
}

impl Controller {
    /// Controller at the Upload stage with an empty session.
    pub fn new(api: ApiClient) -> Self {
        Self {
            ui: UiState::default(),
            api,
            jobs: Jobs::new(),
            wizard: WizardController::new(),
            index: None,
            filter: FilterState::new(),
            selection: SelectionSet::new(),
            renderer: MapRenderer::new(),
        }
    }

    /// Current wizard stage.
    pub fn stage(&self) -> Stage {
        self.wizard.stage()
    }

    /// Read-only wizard access for panels that show stored payloads.
    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    /// True while any upload/analyze/export call is outstanding; the UI
    /// disables duplicate-triggering controls while set.
    pub fn busy(&self) -> bool {
        self.jobs.busy()
    }

    pub(crate) fn upload_pending(&self) -> bool {
        self.jobs.upload_pending()
    }

    pub(crate) fn analyze_pending(&self) -> bool {
        self.jobs.analyze_pending()
    }

    pub(crate) fn export_pending(&self) -> Option<ExportKind> {
        self.jobs.export_pending()
    }

    /// Append to the status log and mirror the entry to tracing.
    pub fn set_status(&mut self, message: impl Into<String>, tone: StatusTone) {
        let message = message.into();
        match tone {
            StatusTone::Info => tracing::info!("{message}"),
            StatusTone::Error => tracing::warn!("{message}"),
        }
        self.ui.status.push(message, tone);
    }

    /// Kick off an advisory health probe. Never blocks anything.
    pub fn request_health_probe(&mut self) {
        self.jobs.begin_health(self.api.clone());
    }

    /// Open a file dialog and upload the picked file.
    pub fn pick_and_upload(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Survey data", &["xlsx", "xls", "csv"])
            .pick_file()
        else {
            return;
        };
        self.upload_file(path);
    }

    /// Upload a survey file through the upload collaborator.
    pub fn upload_file(&mut self, path: PathBuf) {
        if !self.jobs.begin_upload(self.api.clone(), path.clone()) {
            self.set_status("An upload is already running", StatusTone::Info);
            return;
        }
        self.set_status(
            format!("Uploading {}…", path.display()),
            StatusTone::Info,
        );
        self.ui.upload.picked_file = Some(path);
    }

    /// Drain finished background jobs. Called once per frame.
    pub fn poll_jobs(&mut self) {
        loop {
            let message = match self.jobs.try_recv_message() {
                Ok(message) => message,
                Err(_) => break,
            };
            match message {
                JobMessage::Uploaded(result) => {
                    self.jobs.clear_upload();
                    self.apply_upload_outcome(result);
                }
                JobMessage::Analyzed(result) => {
                    self.jobs.clear_analyze();
                    self.apply_analyze_outcome(result);
                }
                JobMessage::Exported { kind, result } => {
                    self.jobs.clear_export();
                    self.apply_export_outcome(kind, result);
                }
                JobMessage::HealthChecked(healthy) => {
                    self.jobs.clear_health();
                    self.ui.status.backend_healthy = Some(healthy);
                }
            }
        }
    }

    pub(crate) fn apply_upload_outcome(&mut self, result: Result<UploadResponse, ApiError>) {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.set_status(err.to_string(), StatusTone::Error);
                return;
            }
        };
        let columns = response.columns.len();
        let candidates = response.tag_candidates.clone();
        match self.wizard.complete_upload(response) {
            Ok(()) => {
                self.ui.tags = Default::default();
                self.ui.tags.candidates = candidates;
                self.set_status(
                    format!(
                        "File parsed: {columns} columns, {} tag candidates",
                        self.ui.tags.candidates.len()
                    ),
                    StatusTone::Info,
                );
            }
            Err(err) => self.set_status(err.to_string(), StatusTone::Error),
        }
    }

    pub(crate) fn apply_analyze_outcome(&mut self, result: Result<AnalysisResult, ApiError>) {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                self.set_status(err.to_string(), StatusTone::Error);
                return;
            }
        };
        let points = result.data_points.len();
        let clusters = result.clusters.len();
        match self.wizard.complete_analysis(result) {
            Ok(()) => {
                self.set_status(
                    format!("Analysis complete: {points} points in {clusters} clusters"),
                    StatusTone::Info,
                );
                self.sync_map_session();
            }
            Err(err) => self.set_status(err.to_string(), StatusTone::Error),
        }
    }

    fn apply_export_outcome(&mut self, kind: ExportKind, result: Result<Vec<u8>, ApiError>) {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                self.set_status(err.to_string(), StatusTone::Error);
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(kind.filename())
            .save_file()
        else {
            self.set_status(
                format!("{} export canceled", kind.label()),
                StatusTone::Info,
            );
            return;
        };
        match std::fs::write(&path, &bytes) {
            Ok(()) => {
                self.set_status(
                    format!("{} saved to {}", kind.label(), path.display()),
                    StatusTone::Info,
                );
                if let Err(err) = open::that(&path) {
                    tracing::debug!("Could not open {}: {err}", path.display());
                }
            }
            Err(err) => self.set_status(
                format!("Failed to write {}: {err}", path.display()),
                StatusTone::Error,
            ),
        }
    }

    /// Add the candidate described by the add form.
    pub fn add_tag_candidate(&mut self) {
        let text = self.ui.tags.new_text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let category = Some(self.ui.tags.new_category.trim())
            .filter(|category| !category.is_empty())
            .map(|category| category.to_string());
        self.ui
            .tags
            .candidates
            .push(TagCandidate::manual(text, category));
        self.ui.tags.new_text.clear();
        self.ui.tags.new_category.clear();
        self.ui.tags.show_add_form = false;
    }

    /// Remove a candidate by its position in the unfiltered list.
    pub fn delete_tag_candidate(&mut self, index: usize) {
        if index < self.ui.tags.candidates.len() {
            self.ui.tags.candidates.remove(index);
        }
    }

    /// Finalize the edited candidates and advance to the Analysis stage.
    pub fn finalize_tags(&mut self) {
        let candidates = self.ui.tags.candidates.clone();
        match self.wizard.finalize_tags(&candidates) {
            Ok(()) => {
                self.ui.analysis = Default::default();
                self.set_status(
                    format!("{} tag rules finalized", candidates.len()),
                    StatusTone::Info,
                );
            }
            Err(err) => self.set_status(err.to_string(), StatusTone::Error),
        }
    }

    /// Stored analysis request, if the wizard has synthesized one.
    pub fn request(&self) -> Option<&AnalysisRequest> {
        self.wizard.request()
    }

    /// Mutable request for the Analysis stage's parameter widgets.
    pub fn request_mut(&mut self) -> Option<&mut AnalysisRequest> {
        self.wizard.request_mut()
    }

    /// Validate and submit the analysis request.
    pub fn run_analysis(&mut self) {
        if let Err(err) = self.wizard.validate_request() {
            self.ui.analysis.text_column_error = Some(err.to_string());
            self.set_status(err.to_string(), StatusTone::Error);
            return;
        }
        self.ui.analysis.text_column_error = None;
        let Some(request) = self.wizard.request().cloned() else {
            return;
        };
        if !self.jobs.begin_analyze(self.api.clone(), request) {
            self.set_status("An analysis is already running", StatusTone::Info);
            return;
        }
        self.set_status("Running analysis…", StatusTone::Info);
    }

    /// Request a rendered export from the backend.
    pub(crate) fn export(&mut self, kind: ExportKind) {
        if !self.jobs.begin_export(self.api.clone(), kind) {
            self.set_status("An export is already running", StatusTone::Info);
            return;
        }
        self.set_status(format!("Exporting {}…", kind.label()), StatusTone::Info);
    }

    /// Navigate to the predecessor stage.
    pub fn back(&mut self) {
        if self.jobs.busy() {
            self.set_status("Wait for the running request to finish", StatusTone::Info);
            return;
        }
        if self.wizard.back() {
            self.sync_map_session();
        }
    }

    /// Return to Upload and discard all session state.
    pub fn reset(&mut self) {
        self.wizard.reset();
        self.ui.tags = Default::default();
        self.ui.analysis = Default::default();
        self.ui.upload = Default::default();
        self.sync_map_session();
        self.set_status("Session reset", StatusTone::Info);
    }

    /// Index over the current result, if one is stored.
    pub fn index(&self) -> Option<&ResultIndex> {
        self.index.as_ref()
    }

    /// Current result, if the wizard has one.
    pub fn result(&self) -> Option<&Rc<AnalysisResult>> {
        self.wizard.result()
    }

    /// Active filter state.
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Current selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Toggle a tag in the filter.
    pub fn toggle_tag_filter(&mut self, tag: &str) {
        self.filter.toggle_tag(tag);
    }

    /// Replace the cluster restriction.
    pub fn set_cluster_filter(&mut self, cluster: Option<i32>) {
        self.filter.set_cluster(cluster);
    }

    /// Clear both filter criteria. The selection stays untouched.
    pub fn clear_filters(&mut self) {
        self.filter.clear();
    }

    /// Empty the selection. Filters stay untouched.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Resolve a map click: points toggle selection, centroids are no-ops.
    pub fn click_item(&mut self, item: &SceneItemId) {
        if MapRenderer::handle_click(item, &mut self.selection) {
            if let SceneItemId::Point(id) = item {
                let state = if self.selection.contains(id) {
                    "selected"
                } else {
                    "deselected"
                };
                tracing::debug!("Point {id} {state}");
            }
        }
    }

    /// Tooltip body for a hovered map item.
    pub fn tooltip(&self, item: &SceneItemId) -> Option<String> {
        let index = self.index.as_ref()?;
        MapRenderer::tooltip(index, item)
    }

    /// Scene for the current result and filter; `None` outside a
    /// visualization session. Cloned out because the egui canvas redraws
    /// every frame while the controller stays mutable.
    pub fn scene(&mut self) -> Option<MapScene> {
        let index = self.index.as_ref()?;
        Some(self.renderer.scene(index, &self.filter).clone())
    }

    /// Rebuild or drop the map session after the stored result changed.
    ///
    /// A new result starts a fresh session: filter, selection, and viewport
    /// reset, and the previous scene is released before the next build.
    fn sync_map_session(&mut self) {
        let current = self.wizard.result().cloned();
        let stale = match (&self.index, &current) {
            (None, None) => false,
            (Some(index), Some(result)) => !Rc::ptr_eq(&index.result_rc(), result),
            _ => true,
        };
        if !stale {
            return;
        }
        self.renderer.invalidate();
        self.filter.clear();
        self.selection.clear();
        self.ui.map.reset_view();
        self.index = current.map(ResultIndex::new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cluster, DataPoint, PointId};
    use std::collections::BTreeMap;

    fn controller() -> Controller {
        Controller::new(ApiClient::new("http://127.0.0.1:1"))
    }

    fn upload_response() -> UploadResponse {
        UploadResponse {
            success: true,
            message: "parsed".to_string(),
            columns: vec!["id".to_string(), "free_text".to_string()],
            sample_data: Vec::new(),
            tag_candidates: vec![TagCandidate {
                text: "残業".to_string(),
                score: 0.8,
                category: None,
                count: 3,
            }],
        }
    }

    fn analysis_result() -> AnalysisResult {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            0,
            Cluster {
                size: 1,
                top_tags: vec!["残業".to_string()],
                center_x: 0.0,
                center_y: 0.0,
            },
        );
        AnalysisResult {
            data_points: vec![DataPoint {
                id: PointId::from(0),
                text: "夜勤が多い".to_string(),
                x: 0.0,
                y: 0.0,
                cluster_id: 0,
                tags: vec!["残業".to_string()],
                group: None,
                metadata: serde_json::Map::new(),
            }],
            clusters,
            tags: vec!["残業".to_string()],
            config: serde_json::Map::new(),
        }
    }

    fn controller_at_visualization() -> Controller {
        let mut controller = controller();
        controller.apply_upload_outcome(Ok(upload_response()));
        controller.finalize_tags();
        controller.apply_analyze_outcome(Ok(analysis_result()));
        controller
    }

    #[test]
    fn upload_outcome_seeds_the_tag_editor() {
        let mut controller = controller();
        controller.apply_upload_outcome(Ok(upload_response()));
        assert_eq!(controller.stage(), Stage::Tags);
        assert_eq!(controller.ui.tags.candidates.len(), 1);
        assert_eq!(controller.ui.tags.candidates[0].text, "残業");
    }

    #[test]
    fn failed_upload_stays_in_upload_and_logs() {
        let mut controller = controller();
        let mut response = upload_response();
        response.success = false;
        response.message = "no columns".to_string();
        controller.apply_upload_outcome(Ok(response));
        assert_eq!(controller.stage(), Stage::Upload);
        let latest = controller.ui.status.latest().unwrap();
        assert_eq!(latest.tone, StatusTone::Error);
        assert!(latest.message.contains("no columns"));
    }

    #[test]
    fn analyze_outcome_builds_the_map_session() {
        let mut controller = controller_at_visualization();
        assert_eq!(controller.stage(), Stage::Visualization);
        assert!(controller.index().is_some());
        let scene = controller.scene().unwrap();
        assert_eq!(scene.point_count(), 1);
        assert_eq!(scene.centroids.len(), 1);
    }

    #[test]
    fn run_analysis_blocks_on_missing_text_column() {
        let mut controller = controller();
        controller.apply_upload_outcome(Ok(upload_response()));
        controller.finalize_tags();
        controller
            .request_mut()
            .unwrap()
            .column_mapping
            .text_column
            .clear();
        controller.run_analysis();
        assert!(controller.ui.analysis.text_column_error.is_some());
        assert!(!controller.analyze_pending());
        assert_eq!(controller.stage(), Stage::Analysis);
    }

    #[test]
    fn filters_and_selection_have_independent_lifecycles() {
        let mut controller = controller_at_visualization();
        controller.click_item(&SceneItemId::Point(PointId::from(0)));
        controller.toggle_tag_filter("残業");
        controller.clear_filters();
        assert!(controller.selection().contains(&PointId::from(0)));
        controller.toggle_tag_filter("残業");
        controller.clear_selection();
        assert!(controller.filter().has_tag("残業"));
    }

    #[test]
    fn centroid_clicks_do_not_select() {
        let mut controller = controller_at_visualization();
        controller.click_item(&SceneItemId::Centroid(0));
        assert!(controller.selection().is_empty());
    }

    #[test]
    fn back_from_visualization_keeps_result_but_ends_session() {
        let mut controller = controller_at_visualization();
        controller.click_item(&SceneItemId::Point(PointId::from(0)));
        controller.back();
        assert_eq!(controller.stage(), Stage::Analysis);
        assert!(controller.result().is_some());
        assert!(controller.index().is_some());
    }

    #[test]
    fn reset_discards_the_whole_session() {
        let mut controller = controller_at_visualization();
        controller.toggle_tag_filter("残業");
        controller.click_item(&SceneItemId::Point(PointId::from(0)));
        controller.reset();
        assert_eq!(controller.stage(), Stage::Upload);
        assert!(controller.index().is_none());
        assert!(controller.scene().is_none());
        assert!(controller.selection().is_empty());
        assert!(controller.filter().is_empty());
        assert!(controller.ui.tags.candidates.is_empty());
    }

    #[test]
    fn tag_editor_add_and_delete() {
        let mut controller = controller();
        controller.apply_upload_outcome(Ok(upload_response()));
        controller.ui.tags.new_text = " 給与 ".to_string();
        controller.ui.tags.new_category = "".to_string();
        controller.add_tag_candidate();
        assert_eq!(controller.ui.tags.candidates.len(), 2);
        let added = &controller.ui.tags.candidates[1];
        assert_eq!(added.text, "給与");
        assert_eq!(added.score, 0.0);
        assert_eq!(added.count, 1);
        assert!(added.category.is_none());
        controller.delete_tag_candidate(0);
        assert_eq!(controller.ui.tags.candidates.len(), 1);
        assert_eq!(controller.ui.tags.candidates[0].text, "給与");
    }
}
