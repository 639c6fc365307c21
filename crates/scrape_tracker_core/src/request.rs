use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which transport the client asks the server for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportPreference {
    /// Stream if the server streams, poll if it acknowledges instead.
    #[default]
    Auto,
    Streaming,
    Polling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Suggested file name for the finished result.
    pub output: String,
    /// Follow candidate links one level deep.
    pub crawl_detail: bool,
    pub depth: u32,
    pub max_pages: u32,
    /// Overrides the tracker's default transport when set.
    pub transport: Option<TransportPreference>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            output: "output.json".to_string(),
            crawl_detail: false,
            depth: 0,
            max_pages: 10,
            transport: None,
        }
    }
}

/// What to submit: created once, never mutated after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub target: String,
    pub prompt: String,
    #[serde(default)]
    pub options: JobOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("job target must not be empty")]
    EmptyTarget,
}

impl JobRequest {
    pub fn new(target: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prompt: prompt.into(),
            options: JobOptions::default(),
        }
    }

    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.target.trim().is_empty() {
            return Err(RequestError::EmptyTarget);
        }
        Ok(())
    }

    /// The request's own transport choice, falling back to `default`.
    pub fn transport_or(&self, default: TransportPreference) -> TransportPreference {
        self.options.transport.unwrap_or(default)
    }
}
