use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use scrape_tracker_core::{JobId, JobRequest, TransportPreference};
use tracker_logging::{tracker_debug, tracker_info};
use url::Url;

use crate::error::map_reqwest_error;
use crate::{Acknowledgment, StatusReport, SubmitPayload, TrackerError, TrackerSettings};

/// Chunked response body.
pub type ByteStream = BoxStream<'static, Result<Bytes, TrackerError>>;

/// What the submission endpoint handed back.
pub enum Submission {
    /// Newline-delimited JSON progress records, read until the body ends.
    Stream(ByteStream),
    /// The server runs the job in the background under this id.
    Acknowledged { job_id: JobId },
}

/// Server-side job endpoints.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn submit(
        &self,
        request: &JobRequest,
        preference: TransportPreference,
    ) -> Result<Submission, TrackerError>;

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TrackerError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    client: reqwest::Client,
    submit_url: Url,
    status_url: Url,
    request_timeout: Duration,
}

impl ReqwestJobApi {
    pub fn new(settings: &TrackerSettings) -> Result<Self, TrackerError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| TrackerError::Config(format!("base url: {err}")))?;
        let submit_url = base
            .join(&settings.submit_path)
            .map_err(|err| TrackerError::Config(format!("submit path: {err}")))?;
        let status_url = base
            .join(&settings.status_path)
            .map_err(|err| TrackerError::Config(format!("status path: {err}")))?;
        if status_url.cannot_be_a_base() {
            return Err(TrackerError::Config(format!(
                "status url {status_url} cannot take a job id"
            )));
        }

        // No client-wide timeout: a streamed body stays open for the whole job.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| TrackerError::Config(err.to_string()))?;

        Ok(Self {
            client,
            submit_url,
            status_url,
            request_timeout: settings.request_timeout,
        })
    }

    fn status_url_for(&self, job_id: &JobId) -> Result<Url, TrackerError> {
        let mut url = self.status_url.clone();
        url.path_segments_mut()
            .map_err(|_| TrackerError::Config("status url cannot take a job id".to_string()))?
            .pop_if_empty()
            .push(job_id.as_str());
        Ok(url)
    }

    /// Reads a plain-JSON answer just far enough to tell an acknowledgment
    /// from a progress stream labelled `application/json`.
    ///
    /// The answer is an acknowledgment only if the whole body arrives within
    /// `request_timeout` and parses as one. A complete first line holding a
    /// non-acknowledgment record, or a body still open at the deadline, is a
    /// stream; the bytes read so far are replayed in front of the rest.
    async fn sniff(&self, mut body: ByteStream) -> Result<Submission, TrackerError> {
        let deadline = tokio::time::Instant::now() + self.request_timeout;
        let mut peeked = Vec::new();

        loop {
            match tokio::time::timeout_at(deadline, body.next()).await {
                Err(_) => {
                    tracker_debug!(
                        "JSON answer still open after {:?}; reading it as a stream",
                        self.request_timeout
                    );
                    return Ok(Submission::Stream(replay(peeked, body)));
                }
                Ok(None) => break,
                Ok(Some(chunk)) => {
                    peeked.extend_from_slice(&chunk?);
                    if starts_with_progress_record(&peeked) {
                        return Ok(Submission::Stream(replay(peeked, body)));
                    }
                }
            }
        }

        match Acknowledgment::parse(&peeked) {
            Ok(ack) if ack.is_acknowledgment() => {
                let job_id = ack.into_job_id()?;
                tracker_info!(
                    "Server acknowledged job {}; falling back to polling",
                    job_id
                );
                Ok(Submission::Acknowledged { job_id })
            }
            // Plain JSON that is not an acknowledgment is read as a
            // single-chunk stream.
            _ => Ok(Submission::Stream(replay(peeked, Box::pin(stream::empty())))),
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Bytes, TrackerError> {
        tokio::time::timeout(self.request_timeout, response.bytes())
            .await
            .map_err(|_| TrackerError::Timeout)?
            .map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn submit(
        &self,
        request: &JobRequest,
        preference: TransportPreference,
    ) -> Result<Submission, TrackerError> {
        let body = serde_json::to_vec(&SubmitPayload::new(request, preference))
            .map_err(|err| TrackerError::MalformedPayload(err.to_string()))?;

        let pending = self
            .client
            .post(self.submit_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept_for(preference))
            .body(body)
            .send();
        let response = tokio::time::timeout(self.request_timeout, pending)
            .await
            .map_err(|_| TrackerError::Timeout)?
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Rejected {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase());
        tracker_debug!(
            "Submission answered status={} content_type={:?}",
            status,
            content_type
        );

        match preference {
            TransportPreference::Streaming => Ok(Submission::Stream(body_stream(response))),
            TransportPreference::Polling => {
                let bytes = self.read_body(response).await?;
                let job_id = Acknowledgment::parse(&bytes)?.into_job_id()?;
                Ok(Submission::Acknowledged { job_id })
            }
            TransportPreference::Auto => {
                if !is_plain_json(content_type.as_deref()) {
                    return Ok(Submission::Stream(body_stream(response)));
                }
                self.sniff(body_stream(response)).await
            }
        }
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TrackerError> {
        let url = self.status_url_for(job_id)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Rejected {
                status: status.as_u16(),
            });
        }

        let bytes = self.read_body(response).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| TrackerError::MalformedPayload(format!("status: {err}")))
    }
}

fn accept_for(preference: TransportPreference) -> &'static str {
    match preference {
        TransportPreference::Streaming => "application/x-ndjson",
        TransportPreference::Polling => "application/json",
        TransportPreference::Auto => "application/x-ndjson, application/json",
    }
}

fn is_plain_json(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    mime == "application/json"
}

/// Whether the first complete, non-blank line is a JSON record other than
/// an acknowledgment. A pretty-printed body fails to parse line by line and
/// keeps being read.
fn starts_with_progress_record(peeked: &[u8]) -> bool {
    let Some(end) = peeked.iter().rposition(|byte| *byte == b'\n') else {
        return false;
    };
    let Some(line) = peeked[..end]
        .split(|byte| *byte == b'\n')
        .map(<[u8]>::trim_ascii)
        .find(|line| !line.is_empty())
    else {
        return false;
    };
    if serde_json::from_slice::<serde_json::Value>(line).is_err() {
        return false;
    }
    !Acknowledgment::parse(line).is_ok_and(|ack| ack.is_acknowledgment())
}

fn replay(peeked: Vec<u8>, rest: ByteStream) -> ByteStream {
    let head = stream::once(async move { Ok::<_, TrackerError>(Bytes::from(peeked)) });
    head.chain(rest).boxed()
}

fn body_stream(response: reqwest::Response) -> ByteStream {
    Box::pin(
        response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error)),
    )
}
