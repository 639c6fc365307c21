use serde_json::Value;

use crate::{
    FailureReason, JobId, JobState, Msg, Normalizer, ProgressEvent, RawUpdate, TransportKind,
};

/// Per-job state owned by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    id: JobId,
    transport: TransportKind,
    state: JobState,
    started: bool,
    normalizer: Normalizer,
    result: Option<Value>,
    failure: Option<FailureReason>,
}

impl JobRecord {
    pub fn new(id: JobId, transport: TransportKind, placeholder_percent: u8) -> Self {
        Self {
            id,
            transport,
            state: JobState::Pending,
            started: false,
            normalizer: Normalizer::for_transport(transport, placeholder_percent),
            result: None,
            failure: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.normalizer.last_percent()
    }

    fn fail(&mut self, reason: FailureReason, state: JobState) -> ProgressEvent {
        self.state = state;
        self.failure = Some(reason.clone());
        ProgressEvent::Failed { reason }
    }
}

/// Applies a message to a job and returns the events to deliver, in order.
///
/// The first call always yields `Started` first. Once a terminal event has
/// been returned, every later call returns nothing.
pub fn update(job: &mut JobRecord, msg: Msg) -> Vec<ProgressEvent> {
    if job.is_terminal() {
        return Vec::new();
    }

    let mut events = Vec::with_capacity(2);
    if !job.started {
        job.started = true;
        events.push(ProgressEvent::Started {
            job_id: job.id.clone(),
        });
    }

    match msg {
        Msg::Started => {}
        Msg::Update(RawUpdate::Progress { percent, message }) => {
            job.state = JobState::InProgress;
            if let Some(event) = job.normalizer.progress(percent, message) {
                events.push(event);
            }
        }
        Msg::Update(RawUpdate::Completed(result)) => {
            job.state = JobState::Completed;
            job.result = Some(result.clone());
            events.push(ProgressEvent::Completed { result });
        }
        Msg::Update(RawUpdate::Failed(error)) => {
            events.push(job.fail(FailureReason::Remote(error), JobState::Failed));
        }
        Msg::TransportEnded => {
            events.push(job.fail(FailureReason::StreamEnded, JobState::Failed));
        }
        Msg::TransportFailed(reason) => {
            events.push(job.fail(reason, JobState::Failed));
        }
        Msg::CancelRequested => {
            events.push(job.fail(FailureReason::Cancelled, JobState::Cancelled));
        }
    }

    events
}
