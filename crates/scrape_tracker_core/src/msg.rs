use serde_json::Value;

use crate::FailureReason;

/// A payload as reported by a transport, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawUpdate {
    /// `percent` is `None` when the server has not reported a number.
    Progress {
        percent: Option<f64>,
        message: Option<String>,
    },
    Completed(Value),
    /// The server reported the job as failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The transport is up and the job is being observed.
    Started,
    Update(RawUpdate),
    /// The transport finished without delivering a terminal record.
    TransportEnded,
    /// The transport broke or gave up.
    TransportFailed(FailureReason),
    /// User asked to stop tracking.
    CancelRequested,
}
