mod polling;
mod streaming;

pub use polling::PollingStrategy;
pub use streaming::StreamingStrategy;

use scrape_tracker_core::{FailureReason, RawUpdate, TransportKind};

/// One way of observing a submitted job.
///
/// The tracker pulls updates until one is terminal, the transport ends, or
/// the job is cancelled; dropping an in-flight `next_update` future discards
/// whatever it was waiting for.
#[async_trait::async_trait]
pub trait TransportStrategy: Send {
    fn kind(&self) -> TransportKind;

    /// Suspends until the transport has something to report. `Ok(None)`
    /// means the transport ended on its own.
    async fn next_update(&mut self) -> Result<Option<RawUpdate>, FailureReason>;

    /// Releases the connection or timer and drops anything buffered.
    fn stop(&mut self);
}
