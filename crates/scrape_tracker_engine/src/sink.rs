use scrape_tracker_core::{JobId, ProgressEvent};
use tokio::sync::mpsc;

/// Receives every event of the jobs it is attached to, in delivery order.
///
/// Listeners may read the job's handle from inside `emit`, for example to
/// fetch the result on `Completed`. They must not subscribe to or cancel
/// the same job from there; hand the event off instead, for example through
/// [`ChannelSink`].
pub trait ProgressSink: Send + Sync {
    fn emit(&self, job_id: &JobId, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&JobId, &ProgressEvent) + Send + Sync,
{
    fn emit(&self, job_id: &JobId, event: &ProgressEvent) {
        self(job_id, event)
    }
}

/// Forwards events to an async consumer such as a UI task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(JobId, ProgressEvent)>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<(JobId, ProgressEvent)>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<(JobId, ProgressEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, job_id: &JobId, event: &ProgressEvent) {
        // A closed receiver means the UI has gone away; nothing left to tell.
        let _ = self.tx.send((job_id.clone(), event.clone()));
    }
}
