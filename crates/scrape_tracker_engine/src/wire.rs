use scrape_tracker_core::{JobId, JobRequest, RawUpdate, TransportPreference};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TrackerError;

/// Body of the submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitPayload<'a> {
    pub url: &'a str,
    pub prompt: &'a str,
    pub output: &'a str,
    pub crawl_detail: bool,
    pub depth: u32,
    pub max_pages: u32,
    pub transport: TransportPreference,
}

impl<'a> SubmitPayload<'a> {
    pub fn new(request: &'a JobRequest, transport: TransportPreference) -> Self {
        Self {
            url: &request.target,
            prompt: &request.prompt,
            output: &request.options.output,
            crawl_detail: request.options.crawl_detail,
            depth: request.options.depth,
            max_pages: request.options.max_pages,
            transport,
        }
    }
}

/// `{ "status": "started", "workflow_id": ... }` returned when the server
/// runs the job in the background.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Acknowledgment {
    pub status: String,
    #[serde(default)]
    pub workflow_id: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Acknowledgment {
    pub fn parse(bytes: &[u8]) -> Result<Self, TrackerError> {
        serde_json::from_slice(bytes)
            .map_err(|err| TrackerError::MalformedPayload(format!("acknowledgment: {err}")))
    }

    /// Whether this looks like an acknowledgment rather than a single
    /// progress record that happens to be plain JSON.
    pub fn is_acknowledgment(&self) -> bool {
        self.workflow_id.is_some() || matches!(self.status.as_str(), "started" | "failed")
    }

    /// The server-assigned job id, which the client adopts as-is.
    pub fn into_job_id(self) -> Result<JobId, TrackerError> {
        if self.status == "failed" {
            return Err(TrackerError::RemoteFailure(
                self.error.unwrap_or_else(|| "job failed to start".to_string()),
            ));
        }
        let id = match self.workflow_id {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(TrackerError::MalformedPayload(
                    "acknowledgment has no workflow_id".to_string(),
                ))
            }
        };
        Ok(JobId::new(id))
    }
}

/// Status endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusReport {
    pub fn into_update(self) -> RawUpdate {
        match self.status.as_str() {
            "completed" => RawUpdate::Completed(self.results.unwrap_or(Value::Null)),
            "failed" => {
                RawUpdate::Failed(self.error.unwrap_or_else(|| "job failed".to_string()))
            }
            _ => RawUpdate::Progress {
                percent: self.progress,
                message: Some(self.message.unwrap_or(self.status)),
            },
        }
    }
}
