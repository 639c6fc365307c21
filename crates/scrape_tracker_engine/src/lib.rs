//! Scrape tracker engine: submits jobs and observes them over a streamed
//! response or by polling, delivering normalized progress events.
mod api;
mod error;
mod handle;
mod settings;
mod sink;
mod tracker;
mod transport;
mod wire;

pub use api::{ByteStream, JobApi, ReqwestJobApi, Submission};
pub use error::TrackerError;
pub use handle::JobHandle;
pub use settings::TrackerSettings;
pub use sink::{ChannelSink, ProgressSink};
pub use tracker::JobTracker;
pub use transport::{PollingStrategy, StreamingStrategy, TransportStrategy};
pub use wire::{Acknowledgment, StatusReport, SubmitPayload};

pub use scrape_tracker_core::{
    FailureReason, JobId, JobOptions, JobRequest, JobState, ProgressEvent, RequestError,
    TransportKind, TransportPreference,
};
