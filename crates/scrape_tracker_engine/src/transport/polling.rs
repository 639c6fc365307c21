use std::sync::Arc;
use std::time::Duration;

use scrape_tracker_core::{FailureReason, JobId, RawUpdate, TransportKind};
use tracker_logging::{tracker_debug, tracker_warn};

use crate::transport::TransportStrategy;
use crate::{JobApi, TrackerError};

/// Queries the status endpoint on a fixed interval.
pub struct PollingStrategy {
    api: Arc<dyn JobApi>,
    job_id: JobId,
    interval: Duration,
    max_attempts: Option<u32>,
    attempts: u32,
    stopped: bool,
}

impl PollingStrategy {
    pub fn new(
        api: Arc<dyn JobApi>,
        job_id: JobId,
        interval: Duration,
        max_attempts: Option<u32>,
    ) -> Self {
        Self {
            api,
            job_id,
            interval,
            max_attempts,
            attempts: 0,
            stopped: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[async_trait::async_trait]
impl TransportStrategy for PollingStrategy {
    fn kind(&self) -> TransportKind {
        TransportKind::Polling
    }

    async fn next_update(&mut self) -> Result<Option<RawUpdate>, FailureReason> {
        loop {
            if self.stopped {
                return Ok(None);
            }
            if self.max_attempts.is_some_and(|max| self.attempts >= max) {
                return Err(FailureReason::Timeout);
            }

            tokio::time::sleep(self.interval).await;
            self.attempts += 1;

            match self.api.status(&self.job_id).await {
                Ok(report) => {
                    tracker_debug!(
                        "Job {} poll #{} status={}",
                        self.job_id,
                        self.attempts,
                        report.status
                    );
                    return Ok(Some(report.into_update()));
                }
                Err(TrackerError::MalformedPayload(detail)) => {
                    tracker_warn!(
                        "Job {} poll #{} dropped malformed status: {}",
                        self.job_id,
                        self.attempts,
                        detail
                    );
                }
                // Not retried: a broken poll ends the job.
                Err(err) => return Err(err.into_failure_reason()),
            }
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
