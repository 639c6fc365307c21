#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use scrape_tracker_engine::{
    ByteStream, JobApi, JobId, JobRequest, ProgressEvent, ProgressSink, StatusReport, Submission,
    TrackerError, TransportPreference,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

/// Collects every event it is handed, tagged with the job id.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(JobId, ProgressEvent)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn events_for(&self, job_id: &JobId) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == job_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Yields to the runtime until at least `count` events have arrived.
    pub async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("events were not delivered in time");
    }
}

impl ProgressSink for Recorder {
    fn emit(&self, job_id: &JobId, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap()
            .push((job_id.clone(), event.clone()));
    }
}

/// Checks the delivery contract: one `Started` first, one terminal event
/// last, non-decreasing percent in between.
pub fn assert_well_formed(events: &[ProgressEvent]) {
    assert!(events.len() >= 2, "too few events: {events:?}");
    assert!(
        matches!(events[0], ProgressEvent::Started { .. }),
        "first event is not Started: {events:?}"
    );
    assert!(
        events[events.len() - 1].is_terminal(),
        "last event is not terminal: {events:?}"
    );
    let middle = &events[1..events.len() - 1];
    assert!(
        middle
            .iter()
            .all(|event| matches!(event, ProgressEvent::Progress { .. })),
        "unexpected event between Started and terminal: {events:?}"
    );
    let percents: Vec<u8> = middle
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(
        percents.windows(2).all(|pair| pair[0] <= pair[1]),
        "percent went backwards: {percents:?}"
    );
}

pub fn progress(percent: u8, message: &str) -> ProgressEvent {
    ProgressEvent::Progress {
        percent,
        message: message.to_string(),
    }
}

pub fn started(id: &str) -> ProgressEvent {
    ProgressEvent::Started {
        job_id: JobId::from(id),
    }
}

pub fn status(value: serde_json::Value) -> Result<StatusReport, TrackerError> {
    Ok(serde_json::from_value(value).unwrap())
}

/// Body that yields `chunks` and then ends.
pub fn body(chunks: &[&str]) -> ByteStream {
    let chunks: Vec<Result<Bytes, TrackerError>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from(chunk.to_string())))
        .collect();
    Box::pin(stream::iter(chunks))
}

/// Body that yields `chunks` and then never ends.
pub fn open_body(chunks: &[&str]) -> ByteStream {
    let chunks: Vec<Result<Bytes, TrackerError>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::from(chunk.to_string())))
        .collect();
    Box::pin(stream::iter(chunks).chain(stream::pending()))
}

/// In-memory server: one scripted submission answer and a queue of status
/// answers. Once the queue is empty every poll reports `in_progress`.
pub struct FakeApi {
    submission: Mutex<Option<Result<Submission, TrackerError>>>,
    statuses: Mutex<VecDeque<Result<StatusReport, TrackerError>>>,
    status_calls: AtomicUsize,
    submitted: Mutex<Vec<(JobRequest, TransportPreference)>>,
}

impl FakeApi {
    pub fn streaming(body: ByteStream) -> Arc<Self> {
        Self::with_submission(Ok(Submission::Stream(body)), Vec::new())
    }

    pub fn polling(job_id: &str, statuses: Vec<Result<StatusReport, TrackerError>>) -> Arc<Self> {
        Self::with_submission(
            Ok(Submission::Acknowledged {
                job_id: JobId::from(job_id),
            }),
            statuses,
        )
    }

    pub fn with_submission(
        submission: Result<Submission, TrackerError>,
        statuses: Vec<Result<StatusReport, TrackerError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            submission: Mutex::new(Some(submission)),
            statuses: Mutex::new(statuses.into()),
            status_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        })
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(JobRequest, TransportPreference)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JobApi for FakeApi {
    async fn submit(
        &self,
        request: &JobRequest,
        preference: TransportPreference,
    ) -> Result<Submission, TrackerError> {
        self.submitted
            .lock()
            .unwrap()
            .push((request.clone(), preference));
        self.submission
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(TrackerError::TransportUnavailable("no answer".into())))
    }

    async fn status(&self, _job_id: &JobId) -> Result<StatusReport, TrackerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| status(serde_json::json!({"status": "in_progress"})))
    }
}
