use scrape_tracker_core::{FailureReason, RequestError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// Rejected before any network activity.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
    #[error("server responded with status {status}")]
    Rejected { status: u16 },
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// The server reported the job as failed.
    #[error("remote failure: {0}")]
    RemoteFailure(String),
    #[error("cancelled")]
    Cancelled,
    #[error("timed out")]
    Timeout,
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TrackerError {
    /// How this error reads once it has ended a running job.
    pub fn into_failure_reason(self) -> FailureReason {
        match self {
            TrackerError::TransportUnavailable(detail) => FailureReason::Transport(detail),
            TrackerError::Rejected { status } => FailureReason::HttpStatus(status),
            TrackerError::RemoteFailure(detail) => FailureReason::Remote(detail),
            TrackerError::Cancelled => FailureReason::Cancelled,
            TrackerError::Timeout => FailureReason::Timeout,
            other => FailureReason::Transport(other.to_string()),
        }
    }
}

impl From<FailureReason> for TrackerError {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Cancelled => TrackerError::Cancelled,
            FailureReason::StreamEnded => TrackerError::TransportUnavailable(reason.to_string()),
            FailureReason::Remote(detail) => TrackerError::RemoteFailure(detail),
            FailureReason::Transport(detail) => TrackerError::TransportUnavailable(detail),
            FailureReason::HttpStatus(status) => TrackerError::Rejected { status },
            FailureReason::Timeout => TrackerError::Timeout,
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TrackerError {
    if err.is_timeout() {
        return TrackerError::Timeout;
    }
    TrackerError::TransportUnavailable(err.to_string())
}
