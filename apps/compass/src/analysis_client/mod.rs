//! Analysis Client — the single point of entry for calls to the remote scoring service.
//!
//! The service owns prompting and model invocation. This module only ships the
//! two inputs across and classifies what comes back. One attempt per call; a
//! failure is reported to the caller as-is.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::{AnalysisInput, AnalysisReply, UploadedFile};

const ANALYZE_FILES_ENDPOINT: &str = "/analyze/files";
const ANALYZE_TEXT_ENDPOINT: &str = "/analyze/text";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Why a call to the scoring service produced no usable reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisFailure {
    #[error("request timed out")]
    Timeout,

    #[error("analysis service unreachable")]
    NetworkUnreachable,

    #[error("no response from analysis service")]
    NoResponse,

    #[error("analysis service error (status {status})")]
    ServerError { status: u16, detail: Option<String> },
}

impl AnalysisFailure {
    /// Message shown to the user in the failed view.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisFailure::Timeout => {
                "Request timeout. The analysis is taking too long.".to_string()
            }
            AnalysisFailure::NetworkUnreachable => {
                "Network error. Make sure the backend server is running.".to_string()
            }
            AnalysisFailure::NoResponse => {
                "No response from server. Make sure the backend is running.".to_string()
            }
            AnalysisFailure::ServerError {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            AnalysisFailure::ServerError { status, .. } => format!("Server error: {status}"),
        }
    }

    fn from_send_error(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisFailure::Timeout
        } else if e.is_connect() {
            AnalysisFailure::NetworkUnreachable
        } else {
            AnalysisFailure::NoResponse
        }
    }
}

/// The scoring collaborator. Implement this to swap transports without touching
/// the orchestrator.
///
/// Carried in `AppState` as `Arc<dyn AnalysisService>`.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisReply, AnalysisFailure>;
}

#[derive(Debug, Serialize)]
struct TextAnalysisRequest<'a> {
    resume_text: &'a str,
    job_description: &'a str,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP implementation of `AnalysisService`.
#[derive(Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_files(
        &self,
        resume: &UploadedFile,
        job_description: &UploadedFile,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let form = Form::new()
            .part("resume", file_part(resume))
            .part("job_description", file_part(job_description));

        self.client
            .post(format!("{}{}", self.base_url, ANALYZE_FILES_ENDPOINT))
            .multipart(form)
            .send()
            .await
    }

    async fn post_text(
        &self,
        resume: &str,
        job_description: &str,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(format!("{}{}", self.base_url, ANALYZE_TEXT_ENDPOINT))
            .json(&TextAnalysisRequest {
                resume_text: resume,
                job_description,
            })
            .send()
            .await
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisReply, AnalysisFailure> {
        let sent = match input {
            AnalysisInput::File {
                resume: Some(resume),
                job_description: Some(job_description),
            } => self.post_files(resume, job_description).await,
            AnalysisInput::File { .. } => {
                // the orchestrator validates before calling; reaching this is a caller bug
                return Err(AnalysisFailure::ServerError {
                    status: 400,
                    detail: Some("Both files are required.".to_string()),
                });
            }
            AnalysisInput::Text {
                resume,
                job_description,
            } => self.post_text(resume, job_description).await,
        };

        let response = sent.map_err(|e| {
            warn!("Analysis request failed: {e}");
            AnalysisFailure::from_send_error(&e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read analysis response body: {e}");
            AnalysisFailure::NoResponse
        })?;

        if !status.is_success() {
            warn!("Analysis service returned {}: {}", status, body);
            return Err(AnalysisFailure::ServerError {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        debug!("Analysis service replied with {} bytes", body.len());
        parse_reply(&body)
    }
}

fn file_part(file: &UploadedFile) -> Part {
    let untyped = || Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
    match file.content_type.as_deref() {
        // an unparsable content type is dropped rather than failing the upload
        Some(mime) => untyped().mime_str(mime).unwrap_or_else(|_| untyped()),
        None => untyped(),
    }
}

/// Pulls `detail` out of a JSON error body. Non-string details are rendered as JSON.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ServiceErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn parse_reply(body: &str) -> Result<AnalysisReply, AnalysisFailure> {
    serde_json::from_str(body).map_err(|e| {
        warn!("Undecodable analysis reply: {e}");
        AnalysisFailure::ServerError {
            status: 502,
            detail: Some(format!("Invalid analysis result: {e}")),
        }
    })
}
