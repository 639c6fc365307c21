use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scrape_tracker_core::{
    update, FailureReason, JobId, JobRecord, JobRequest, JobState, Msg, ProgressEvent,
    TransportKind,
};
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_info};

use crate::{ProgressSink, TrackerError};

/// One submitted job. Cheap to clone; every clone observes the same job.
///
/// The tracker drives the job and is the only writer. A handle stays
/// readable after the tracker has released it, so the UI can still fetch
/// the result of a finished job.
#[derive(Clone)]
pub struct JobHandle {
    shared: Arc<JobShared>,
}

struct JobShared {
    request: JobRequest,
    cancel: CancellationToken,
    // Held for a whole delivery, listener calls included, so events reach
    // every listener in order. Taken before `log`, never after it.
    listeners: Mutex<Vec<Arc<dyn ProgressSink>>>,
    log: Mutex<JobLog>,
    state_tx: watch::Sender<JobState>,
}

struct JobLog {
    record: JobRecord,
    history: Vec<ProgressEvent>,
}

impl JobHandle {
    pub(crate) fn new(
        record: JobRecord,
        request: JobRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(record.state());
        Self {
            shared: Arc::new(JobShared {
                request,
                cancel: CancellationToken::new(),
                listeners: Mutex::new(vec![sink]),
                log: Mutex::new(JobLog {
                    record,
                    history: Vec::new(),
                }),
                state_tx,
            }),
        }
    }

    pub fn id(&self) -> JobId {
        self.lock().record.id().clone()
    }

    pub fn transport(&self) -> TransportKind {
        self.lock().record.transport()
    }

    pub fn state(&self) -> JobState {
        self.lock().record.state()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn request(&self) -> &JobRequest {
        &self.shared.request
    }

    /// Suggested file name for the downloaded result.
    pub fn output_name(&self) -> &str {
        &self.shared.request.options.output
    }

    /// The completed payload, once `Completed` has been delivered.
    pub fn result(&self) -> Option<Value> {
        self.lock().record.result().cloned()
    }

    /// The completed payload rendered with two-space indentation.
    pub fn result_pretty_json(&self) -> Option<String> {
        let result = self.result()?;
        serde_json::to_string_pretty(&result).ok()
    }

    pub fn failure(&self) -> Option<FailureReason> {
        self.lock().record.failure().cloned()
    }

    /// Every event delivered so far, in order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().history.clone()
    }

    /// Resolves once the job is terminal: the result on completion, the
    /// failure otherwise.
    pub async fn wait(&self) -> Result<Value, TrackerError> {
        let mut rx = self.shared.state_tx.subscribe();
        // The sender lives as long as `self`, so this only errors if the
        // job can never finish.
        let _ = rx.wait_for(|state| state.is_terminal()).await;

        let log = self.lock();
        match (log.record.result(), log.record.failure()) {
            (Some(result), _) => Ok(result.clone()),
            (None, Some(reason)) => Err(reason.clone().into()),
            (None, None) => Err(TrackerError::Cancelled),
        }
    }

    pub fn ptr_eq(&self, other: &JobHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Replays the events delivered so far, then keeps the listener for
    /// everything that follows.
    pub(crate) fn add_listener(&self, listener: Arc<dyn ProgressSink>) {
        let mut listeners = self.listeners();
        let (id, history) = {
            let log = self.lock();
            (log.record.id().clone(), log.history.clone())
        };
        for event in &history {
            listener.emit(&id, event);
        }
        listeners.push(listener);
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// Applies `msg` and hands the resulting events to every listener.
    /// Returns whether the job is terminal afterwards.
    ///
    /// The event log is unlocked before listeners run, so they may read the
    /// handle.
    pub(crate) fn deliver(&self, msg: Msg) -> bool {
        let listeners = self.listeners();
        let (id, events, state) = {
            let mut log = self.lock();
            let events = update(&mut log.record, msg);
            log.history.extend(events.iter().cloned());
            (log.record.id().clone(), events, log.record.state())
        };

        for event in &events {
            match event {
                ProgressEvent::Completed { .. } => tracker_info!("Job {} completed", id),
                ProgressEvent::Failed { reason } => {
                    tracker_info!("Job {} failed: {}", id, reason)
                }
                other => tracker_debug!("Job {} event {:?}", id, other),
            }
            for listener in listeners.iter() {
                listener.emit(&id, event);
            }
        }
        drop(listeners);

        self.shared.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
        state.is_terminal()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Arc<dyn ProgressSink>>> {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, JobLog> {
        self.shared
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let log = self.lock();
        f.debug_struct("JobHandle")
            .field("id", log.record.id())
            .field("transport", &log.record.transport())
            .field("state", &log.record.state())
            .finish()
    }
}
