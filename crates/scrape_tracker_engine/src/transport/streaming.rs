use std::collections::VecDeque;
use std::time::Duration;

use futures_util::StreamExt;
use scrape_tracker_core::{
    DecodedLine, FailureReason, JobId, LineDecoder, RawUpdate, TransportKind,
};
use tracker_logging::{tracker_trace, tracker_warn};

use crate::transport::TransportStrategy;
use crate::ByteStream;

/// Reads a chunked body of newline-delimited JSON progress records.
pub struct StreamingStrategy {
    job_id: JobId,
    body: Option<ByteStream>,
    decoder: LineDecoder,
    pending: VecDeque<RawUpdate>,
    idle_timeout: Option<Duration>,
}

impl StreamingStrategy {
    pub fn new(job_id: JobId, body: ByteStream, idle_timeout: Option<Duration>) -> Self {
        Self {
            job_id,
            body: Some(body),
            decoder: LineDecoder::new(),
            pending: VecDeque::new(),
            idle_timeout,
        }
    }

    fn enqueue(&mut self, lines: Vec<DecodedLine>) {
        for line in lines {
            match line {
                DecodedLine::Record(record) => self.pending.extend(record.into_updates()),
                DecodedLine::Malformed { line, error } => {
                    tracker_warn!(
                        "Job {} dropped malformed progress line {:?}: {}",
                        self.job_id,
                        line,
                        error
                    );
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl TransportStrategy for StreamingStrategy {
    fn kind(&self) -> TransportKind {
        TransportKind::Streaming
    }

    async fn next_update(&mut self) -> Result<Option<RawUpdate>, FailureReason> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Ok(Some(update));
            }
            let Some(body) = self.body.as_mut() else {
                return Ok(None);
            };

            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.stop();
                        return Err(FailureReason::Timeout);
                    }
                },
                None => body.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    tracker_trace!("Job {} received {} bytes", self.job_id, chunk.len());
                    let lines = self.decoder.push(&chunk);
                    self.enqueue(lines);
                }
                Some(Err(err)) => {
                    self.stop();
                    return Err(err.into_failure_reason());
                }
                None => {
                    self.body = None;
                    let lines = self.decoder.finish();
                    self.enqueue(lines);
                }
            }
        }
    }

    fn stop(&mut self) {
        self.body = None;
        self.decoder.clear();
        self.pending.clear();
    }
}
