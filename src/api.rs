//! Client for the three backend collaborators: upload, analyze, export.
//!
//! The core treats every endpoint as opaque; this module only shapes
//! requests, decodes responses, and classifies failures into the
//! user-facing causes the status log distinguishes (connection refused,
//! host not found, timeout, server status).

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::http_client;
use crate::model::{AnalysisRequest, AnalysisResult, UploadResponse};

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "CLUSTERMAP_API_URL";

/// Backend used when no override is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Largest export blob the client will buffer.
const MAX_EXPORT_BYTES: usize = 50 * 1024 * 1024;

/// A collaborator call failure, classified for the status log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server actively refused the connection.
    #[error("Connection refused by {url}; is the backend running?")]
    ConnectionRefused {
        /// Requested URL.
        url: String,
    },
    /// DNS could not resolve the host.
    #[error("Server not found for {url}; check the configured URL")]
    HostNotFound {
        /// Requested URL.
        url: String,
    },
    /// The request or response timed out.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Requested URL.
        url: String,
    },
    /// The server answered with an error status.
    #[error("Server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message or detail field from the error body, if any.
        message: String,
    },
    /// Transport failed for another reason.
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying transport description.
        message: String,
    },
    /// Reading the local file to upload failed.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        /// File the user picked.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The response body did not match the expected shape.
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder description.
        message: String,
    },
}

/// Thin, cloneable handle around the shared agent and a base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    /// Client for an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Client configured from [`API_URL_ENV`], falling back to
    /// [`DEFAULT_API_URL`]. An unparsable override is ignored with a
    /// warning rather than failing startup.
    pub fn from_env() -> Self {
        let base = std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        match url::Url::parse(&base) {
            Ok(_) => Self::new(base),
            Err(err) => {
                tracing::warn!("Ignoring invalid {API_URL_ENV}={base}: {err}");
                Self::new(DEFAULT_API_URL)
            }
        }
    }

    /// Configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a survey file to the upload collaborator.
    pub fn upload(&self, path: &Path) -> Result<UploadResponse, ApiError> {
        let bytes = std::fs::read(path).map_err(|source| ApiError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin");
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, "file", filename, content_type_for(path), &bytes);
        let url = self.endpoint("/upload");
        let response = http_client::agent()
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body)
            .map_err(|err| classify(err, &url))?;
        decode_json(response, &url)
    }

    /// Submit the analysis request and decode the finished result.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApiError> {
        let url = self.endpoint("/analyze");
        let response = http_client::agent()
            .post(&url)
            .send_json(request)
            .map_err(|err| classify(err, &url))?;
        decode_json(response, &url)
    }

    /// Fetch the rendered map as a PDF blob.
    pub fn export_pdf(&self) -> Result<Vec<u8>, ApiError> {
        self.export_blob("/export/pdf")
    }

    /// Fetch the rendered map as a PNG blob.
    pub fn export_png(&self) -> Result<Vec<u8>, ApiError> {
        self.export_blob("/export/png")
    }

    fn export_blob(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path);
        let response = http_client::agent()
            .get(&url)
            .call()
            .map_err(|err| classify(err, &url))?;
        http_client::read_response_bytes(response, MAX_EXPORT_BYTES).map_err(|err| {
            ApiError::Transport {
                url,
                message: err.to_string(),
            }
        })
    }

    /// Advisory health probe. Never blocks a wizard transition; any failure
    /// reads as unhealthy.
    pub fn health(&self) -> bool {
        let url = self.endpoint("/health");
        let Ok(response) = http_client::agent().get(&url).call() else {
            return false;
        };
        response
            .into_json::<Value>()
            .ok()
            .and_then(|value| {
                value
                    .get("status")
                    .and_then(Value::as_str)
                    .map(|status| status == "healthy")
            })
            .unwrap_or(false)
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    response: ureq::Response,
    url: &str,
) -> Result<T, ApiError> {
    response.into_json().map_err(|err| ApiError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}

fn classify(error: ureq::Error, url: &str) -> ApiError {
    match error {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_string()
                .ok()
                .and_then(|body| error_message_from_body(&body))
                .unwrap_or_else(|| "server error".to_string());
            ApiError::Status { status, message }
        }
        ureq::Error::Transport(transport) => {
            let message = transport.to_string();
            match transport.kind() {
                ureq::ErrorKind::Dns => ApiError::HostNotFound {
                    url: url.to_string(),
                },
                ureq::ErrorKind::ConnectionFailed => ApiError::ConnectionRefused {
                    url: url.to_string(),
                },
                ureq::ErrorKind::Io => classify_io_message(&message, url),
                _ => ApiError::Transport {
                    url: url.to_string(),
                    message,
                },
            }
        }
    }
}

fn classify_io_message(message: &str, url: &str) -> ApiError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timed out") || lowered.contains("timeout") {
        ApiError::Timeout {
            url: url.to_string(),
        }
    } else if lowered.contains("connection refused") {
        ApiError::ConnectionRefused {
            url: url.to_string(),
        }
    } else {
        ApiError::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Pull the `message` or `detail` field out of a JSON error body.
fn error_message_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("detail"))
        .and_then(Value::as_str)
        .map(|text| text.to_string())
}

fn multipart_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    format!("clustermap-{nanos:x}")
}

fn multipart_body(
    boundary: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let client = ApiClient::new("http://localhost:8000//");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("/upload"), "http://localhost:8000/upload");
    }

    #[test]
    fn error_body_prefers_message_over_detail() {
        assert_eq!(
            error_message_from_body(r#"{"message": "bad file", "detail": "ignored"}"#),
            Some("bad file".to_string())
        );
        assert_eq!(
            error_message_from_body(r#"{"detail": "column missing"}"#),
            Some("column missing".to_string())
        );
        assert_eq!(error_message_from_body("not json"), None);
    }

    #[test]
    fn io_messages_classify_timeouts_and_refusals() {
        assert!(matches!(
            classify_io_message("Connection timed out", "u"),
            ApiError::Timeout { .. }
        ));
        assert!(matches!(
            classify_io_message("Connection refused (os error 111)", "u"),
            ApiError::ConnectionRefused { .. }
        ));
        assert!(matches!(
            classify_io_message("broken pipe", "u"),
            ApiError::Transport { .. }
        ));
    }

    #[test]
    fn multipart_body_wraps_bytes_with_boundary() {
        let body = multipart_body("b123", "file", "data.csv", "text/csv", b"a,b\n1,2\n");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--b123\r\n"));
        assert!(text.contains("filename=\"data.csv\""));
        assert!(text.contains("Content-Type: text/csv\r\n\r\na,b\n1,2\n"));
        assert!(text.ends_with("\r\n--b123--\r\n"));
    }

    #[test]
    fn content_types_follow_extensions() {
        assert_eq!(content_type_for(&PathBuf::from("t.XLSX")), content_type_for(&PathBuf::from("t.xlsx")));
        assert_eq!(content_type_for(&PathBuf::from("t.csv")), "text/csv");
        assert_eq!(
            content_type_for(&PathBuf::from("t")),
            "application/octet-stream"
        );
    }
}
