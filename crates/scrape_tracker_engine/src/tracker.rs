use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scrape_tracker_core::{JobId, JobRecord, JobRequest, Msg};
use tracker_logging::{tracker_info, tracker_warn};

use crate::transport::{PollingStrategy, StreamingStrategy, TransportStrategy};
use crate::{
    JobApi, JobHandle, ProgressSink, ReqwestJobApi, Submission, TrackerError, TrackerSettings,
};

/// Submits jobs and drives one transport per job, delivering normalized
/// events to the sink given at construction and to any subscribed listener.
///
/// Runs on the caller's tokio runtime: each submitted job is one spawned
/// task.
#[derive(Clone)]
pub struct JobTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    api: Arc<dyn JobApi>,
    settings: TrackerSettings,
    sink: Arc<dyn ProgressSink>,
    active: Mutex<HashMap<JobId, JobHandle>>,
    next_local_id: AtomicU64,
}

impl JobTracker {
    /// Tracker talking HTTP to `settings.base_url`.
    pub fn new(
        settings: TrackerSettings,
        sink: impl ProgressSink + 'static,
    ) -> Result<Self, TrackerError> {
        let api = ReqwestJobApi::new(&settings)?;
        Ok(Self::with_api(Arc::new(api), settings, sink))
    }

    pub fn with_api(
        api: Arc<dyn JobApi>,
        settings: TrackerSettings,
        sink: impl ProgressSink + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                api,
                settings,
                sink: Arc::new(sink),
                active: Mutex::new(HashMap::new()),
                next_local_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.inner.settings
    }

    /// Sends the job to the server and starts observing it.
    ///
    /// Returns once the server has answered the submission; events follow
    /// asynchronously. No handle exists if this fails.
    pub async fn submit(&self, request: JobRequest) -> Result<JobHandle, TrackerError> {
        if let Err(err) = request.validate() {
            tracker_warn!("Rejected job for target {:?}: {}", request.target, err);
            return Err(err.into());
        }

        let settings = &self.inner.settings;
        let preference = request.transport_or(settings.default_transport);
        tracker_info!(
            "Submitting job target={} transport={:?}",
            request.target,
            preference
        );

        let submission = self.inner.api.submit(&request, preference).await?;
        let (job_id, strategy): (JobId, Box<dyn TransportStrategy>) = match submission {
            Submission::Stream(body) => {
                let seq = self.inner.next_local_id.fetch_add(1, Ordering::Relaxed);
                let job_id = JobId::local(seq);
                let strategy =
                    StreamingStrategy::new(job_id.clone(), body, settings.stream_idle_timeout);
                (job_id, Box::new(strategy))
            }
            Submission::Acknowledged { job_id } => {
                let strategy = PollingStrategy::new(
                    Arc::clone(&self.inner.api),
                    job_id.clone(),
                    settings.poll_interval,
                    settings.max_poll_attempts,
                );
                (job_id, Box::new(strategy))
            }
        };

        let record = JobRecord::new(
            job_id.clone(),
            strategy.kind(),
            settings.placeholder_percent,
        );
        let handle = JobHandle::new(record, request, Arc::clone(&self.inner.sink));
        tracker_info!("Tracking job {} via {}", job_id, strategy.kind());

        let replaced = self
            .inner
            .active()
            .insert(job_id.clone(), handle.clone())
            .is_some();
        if replaced {
            tracker_warn!("Job id {} reused while still active; replacing", job_id);
        }

        tokio::spawn(drive(Arc::clone(&self.inner), handle.clone(), strategy));
        Ok(handle)
    }

    /// Registers `listener` for the handle's events. Events delivered before
    /// the call are replayed first, so every listener sees the full sequence.
    pub fn subscribe(&self, handle: &JobHandle, listener: impl ProgressSink + 'static) {
        handle.add_listener(Arc::new(listener));
    }

    /// Stops tracking the job and delivers `Failed { reason: Cancelled }`.
    /// No-op once the job is terminal.
    pub fn cancel(&self, handle: &JobHandle) {
        if handle.is_terminal() {
            return;
        }
        tracker_info!("Cancelling job {}", handle.id());
        handle.cancel_token().cancel();
        handle.deliver(Msg::CancelRequested);
        self.inner.release(handle);
    }

    pub fn get(&self, job_id: &JobId) -> Option<JobHandle> {
        self.inner.active().get(job_id).cloned()
    }

    /// Ids of jobs that have not yet reached a terminal event, sorted.
    pub fn active_jobs(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.inner.active().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl TrackerInner {
    fn active(&self) -> MutexGuard<'_, HashMap<JobId, JobHandle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, handle: &JobHandle) {
        // Read the id before taking the map lock; listeners may hold the
        // job lock while asking the tracker about active jobs.
        let id = handle.id();
        let mut active = self.active();
        if active.get(&id).is_some_and(|current| current.ptr_eq(handle)) {
            active.remove(&id);
        }
    }
}

async fn drive(
    inner: Arc<TrackerInner>,
    handle: JobHandle,
    mut strategy: Box<dyn TransportStrategy>,
) {
    let cancel = handle.cancel_token();

    if !handle.deliver(Msg::Started) {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = strategy.next_update() => next,
            };
            // A response that raced a cancel is discarded.
            if cancel.is_cancelled() {
                break;
            }
            let msg = match next {
                Ok(Some(update)) => Msg::Update(update),
                Ok(None) => Msg::TransportEnded,
                Err(reason) => Msg::TransportFailed(reason),
            };
            if handle.deliver(msg) {
                break;
            }
        }
    }

    strategy.stop();
    inner.release(&handle);
}
