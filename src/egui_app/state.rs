//! Shared state types for the egui UI.

use egui::{Color32, Pos2, Vec2};
use time::OffsetDateTime;

use crate::map_scene::SceneItemId;
use crate::model::TagCandidate;

/// Entries kept in the status log before the oldest are dropped.
pub const STATUS_LOG_LIMIT: usize = 100;

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug, Default)]
pub struct UiState {
    /// Status log and backend health badge.
    pub status: StatusState,
    /// Upload stage state.
    pub upload: UploadUiState,
    /// Tag editor state.
    pub tags: TagEditorState,
    /// Analysis stage state.
    pub analysis: AnalysisUiState,
    /// Map viewport and hover state.
    pub map: MapUiState,
}

/// Severity of a status entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    /// Normal progress message.
    Info,
    /// Collaborator or validation failure.
    Error,
}

impl StatusTone {
    /// Badge color for the tone.
    pub fn color(self) -> Color32 {
        match self {
            StatusTone::Info => Color32::from_rgb(102, 176, 136),
            StatusTone::Error => Color32::from_rgb(200, 128, 96),
        }
    }
}

/// One line of the visible status log.
#[derive(Clone, Debug)]
pub struct StatusEntry {
    /// User-facing message.
    pub message: String,
    /// Severity.
    pub tone: StatusTone,
    /// When the entry was appended.
    pub at: OffsetDateTime,
}

/// Accumulated status log plus the advisory health indicator.
#[derive(Clone, Debug, Default)]
pub struct StatusState {
    /// Newest entries last; bounded by [`STATUS_LOG_LIMIT`].
    pub log: Vec<StatusEntry>,
    /// Latest health probe outcome; `None` until the first probe returns.
    pub backend_healthy: Option<bool>,
}

impl StatusState {
    /// Append an entry, dropping the oldest beyond the limit.
    pub fn push(&mut self, message: String, tone: StatusTone) {
        self.log.push(StatusEntry {
            message,
            tone,
            at: OffsetDateTime::now_utc(),
        });
        if self.log.len() > STATUS_LOG_LIMIT {
            let excess = self.log.len() - STATUS_LOG_LIMIT;
            self.log.drain(..excess);
        }
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<&StatusEntry> {
        self.log.last()
    }
}

/// Upload stage state.
#[derive(Clone, Debug, Default)]
pub struct UploadUiState {
    /// File picked in the dialog, shown while the upload is in flight.
    pub picked_file: Option<std::path::PathBuf>,
}

/// Editable tag candidate list plus the add/search widgets.
#[derive(Clone, Debug, Default)]
pub struct TagEditorState {
    /// Working copy of the candidates, seeded from the upload response.
    pub candidates: Vec<TagCandidate>,
    /// Case-insensitive search over text and category.
    pub search: String,
    /// Whether the add form is expanded.
    pub show_add_form: bool,
    /// Text for the candidate being added.
    pub new_text: String,
    /// Category for the candidate being added.
    pub new_category: String,
}

/// Analysis stage state.
#[derive(Clone, Debug, Default)]
pub struct AnalysisUiState {
    /// Validation message shown next to the text column input.
    pub text_column_error: Option<String>,
}

/// Map viewport and interaction state.
#[derive(Clone, Debug)]
pub struct MapUiState {
    /// Zoom factor applied on top of the fit-to-view scale.
    pub zoom: f32,
    /// Pan offset in screen pixels.
    pub pan: Vec2,
    /// Pointer position of the drag in progress.
    pub last_drag_pos: Option<Pos2>,
    /// Item currently under the pointer.
    pub hovered: Option<SceneItemId>,
    /// Whether centroid labels are drawn next to the markers.
    pub show_centroid_labels: bool,
}

impl Default for MapUiState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            last_drag_pos: None,
            hovered: None,
            show_centroid_labels: true,
        }
    }
}

impl MapUiState {
    /// Reset viewport and hover state for a fresh result.
    pub fn reset_view(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_log_is_bounded() {
        let mut status = StatusState::default();
        for i in 0..(STATUS_LOG_LIMIT + 5) {
            status.push(format!("entry {i}"), StatusTone::Info);
        }
        assert_eq!(status.log.len(), STATUS_LOG_LIMIT);
        assert_eq!(status.latest().unwrap().message, "entry 104");
        assert_eq!(status.log[0].message, "entry 5");
    }
}
