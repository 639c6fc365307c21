use std::time::Duration;

use scrape_tracker_core::{TransportPreference, DEFAULT_PLACEHOLDER_PERCENT};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub base_url: String,
    pub submit_path: String,
    /// The job id is appended to this path as one segment.
    pub status_path: String,
    pub default_transport: TransportPreference,
    pub poll_interval: Duration,
    /// `None` polls until the server reports a terminal status.
    pub max_poll_attempts: Option<u32>,
    /// Longest wait for the next streamed chunk. `None` waits forever.
    pub stream_idle_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// Applies to the submission handshake and status queries, never to a
    /// streamed body.
    pub request_timeout: Duration,
    pub placeholder_percent: u8,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            submit_path: "/api/scrape".to_string(),
            status_path: "/api/status".to_string(),
            default_transport: TransportPreference::Auto,
            poll_interval: Duration::from_millis(2000),
            max_poll_attempts: Some(1800),
            stream_idle_timeout: Some(Duration::from_secs(10 * 60)),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            placeholder_percent: DEFAULT_PLACEHOLDER_PERCENT,
        }
    }
}

impl TrackerSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
