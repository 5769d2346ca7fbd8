//! Background collaborator calls.
//!
//! Each collaborator gets at most one outstanding call; the pending flags
//! double as the "disable duplicate-triggering controls" signal for the UI.
//! Results come back over a channel drained once per frame, so responses
//! apply in request order by construction.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread;

use crate::api::{ApiClient, ApiError};
use crate::model::{AnalysisRequest, AnalysisResult, UploadResponse};

/// Export format selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExportKind {
    /// Vector export.
    Pdf,
    /// Raster export.
    Png,
}

impl ExportKind {
    /// Fixed filename the blob is saved under.
    pub(crate) fn filename(self) -> &'static str {
        match self {
            ExportKind::Pdf => "clustering_map.pdf",
            ExportKind::Png => "clustering_map.png",
        }
    }

    /// Short label for buttons and log lines.
    pub(crate) fn label(self) -> &'static str {
        match self {
            ExportKind::Pdf => "PDF",
            ExportKind::Png => "PNG",
        }
    }
}

pub(crate) enum JobMessage {
    Uploaded(Result<UploadResponse, ApiError>),
    Analyzed(Result<AnalysisResult, ApiError>),
    Exported {
        kind: ExportKind,
        result: Result<Vec<u8>, ApiError>,
    },
    HealthChecked(bool),
}

/// Channel plus one pending flag per collaborator.
pub(crate) struct Jobs {
    sender: Sender<JobMessage>,
    receiver: Receiver<JobMessage>,
    upload_pending: bool,
    analyze_pending: bool,
    export_pending: Option<ExportKind>,
    health_pending: bool,
}

impl Jobs {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            upload_pending: false,
            analyze_pending: false,
            export_pending: None,
            health_pending: false,
        }
    }

    pub(crate) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.receiver.try_recv()
    }

    /// True while an upload, analyze, or export call is outstanding.
    pub(crate) fn busy(&self) -> bool {
        self.upload_pending || self.analyze_pending || self.export_pending.is_some()
    }

    pub(crate) fn upload_pending(&self) -> bool {
        self.upload_pending
    }

    pub(crate) fn analyze_pending(&self) -> bool {
        self.analyze_pending
    }

    pub(crate) fn export_pending(&self) -> Option<ExportKind> {
        self.export_pending
    }

    /// Start an upload unless one is already in flight.
    pub(crate) fn begin_upload(&mut self, api: ApiClient, path: PathBuf) -> bool {
        if self.upload_pending {
            return false;
        }
        self.upload_pending = true;
        let sender = self.sender.clone();
        thread::spawn(move || {
            let _ = sender.send(JobMessage::Uploaded(api.upload(&path)));
        });
        true
    }

    pub(crate) fn clear_upload(&mut self) {
        self.upload_pending = false;
    }

    /// Start an analysis unless one is already in flight.
    pub(crate) fn begin_analyze(&mut self, api: ApiClient, request: AnalysisRequest) -> bool {
        if self.analyze_pending {
            return false;
        }
        self.analyze_pending = true;
        let sender = self.sender.clone();
        thread::spawn(move || {
            let _ = sender.send(JobMessage::Analyzed(api.analyze(&request)));
        });
        true
    }

    pub(crate) fn clear_analyze(&mut self) {
        self.analyze_pending = false;
    }

    /// Start an export unless one is already in flight.
    pub(crate) fn begin_export(&mut self, api: ApiClient, kind: ExportKind) -> bool {
        if self.export_pending.is_some() {
            return false;
        }
        self.export_pending = Some(kind);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = match kind {
                ExportKind::Pdf => api.export_pdf(),
                ExportKind::Png => api.export_png(),
            };
            let _ = sender.send(JobMessage::Exported { kind, result });
        });
        true
    }

    pub(crate) fn clear_export(&mut self) {
        self.export_pending = None;
    }

    /// Probe backend health unless a probe is already in flight.
    pub(crate) fn begin_health(&mut self, api: ApiClient) -> bool {
        if self.health_pending {
            return false;
        }
        self.health_pending = true;
        let sender = self.sender.clone();
        thread::spawn(move || {
            let _ = sender.send(JobMessage::HealthChecked(api.health()));
        });
        true
    }

    pub(crate) fn clear_health(&mut self) {
        self.health_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_filenames_are_fixed() {
        assert_eq!(ExportKind::Pdf.filename(), "clustering_map.pdf");
        assert_eq!(ExportKind::Png.filename(), "clustering_map.png");
    }

    #[test]
    fn duplicate_analyze_is_refused_while_pending() {
        let mut jobs = Jobs::new();
        let api = ApiClient::new("http://127.0.0.1:1");
        assert!(jobs.begin_analyze(api.clone(), AnalysisRequest::default()));
        assert!(jobs.analyze_pending());
        assert!(!jobs.begin_analyze(api, AnalysisRequest::default()));
        jobs.clear_analyze();
        assert!(!jobs.busy());
    }
}
