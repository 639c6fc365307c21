use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Job identifier. Server-assigned when the server returns one, otherwise
/// assigned locally at submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Client-side id for jobs whose server never echoes one.
    pub fn local(seq: u64) -> Self {
        Self(format!("local-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Why a job ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("cancelled")]
    Cancelled,
    #[error("stream ended without result")]
    StreamEnded,
    /// The server reported the job as failed.
    #[error("{0}")]
    Remote(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timed out")]
    Timeout,
}

/// Normalized, transport-agnostic notification for one job.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { job_id: JobId },
    Progress { percent: u8, message: String },
    Completed { result: Value },
    Failed { reason: FailureReason },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. }
        )
    }
}
