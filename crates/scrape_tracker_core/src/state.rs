use std::fmt;

/// Lifecycle of a tracked job. A job is in exactly one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

/// The mechanism observing a job once it has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Streaming,
    Polling,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Streaming => write!(f, "streaming"),
            TransportKind::Polling => write!(f, "polling"),
        }
    }
}
