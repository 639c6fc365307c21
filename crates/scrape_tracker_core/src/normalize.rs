use crate::{ProgressEvent, TransportKind};

/// Percent reported for "in progress" when the server gives no number.
pub const DEFAULT_PLACEHOLDER_PERCENT: u8 = 50;

/// Maps raw progress reports onto `ProgressEvent::Progress`, keeping the
/// delivered percent within `[0, 100]` and non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    placeholder: u8,
    last_percent: Option<u8>,
}

impl Normalizer {
    pub fn new(placeholder: u8) -> Self {
        Self {
            placeholder: placeholder.min(100),
            last_percent: None,
        }
    }

    /// Polling reports "in progress" without a number, so it gets the
    /// placeholder. A streamed line without a number keeps the current value.
    pub fn for_transport(kind: TransportKind, placeholder: u8) -> Self {
        match kind {
            TransportKind::Polling => Self::new(placeholder),
            TransportKind::Streaming => Self::new(0),
        }
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }

    /// `None` for NaN; everything else is clamped into `[0, 100]`.
    pub fn clamp(raw: f64) -> Option<u8> {
        if raw.is_nan() {
            return None;
        }
        Some(raw.clamp(0.0, 100.0).round() as u8)
    }

    /// Returns `None` when the update would move the percent backwards.
    pub fn progress(
        &mut self,
        percent: Option<f64>,
        message: Option<String>,
    ) -> Option<ProgressEvent> {
        let floor = self.last_percent.unwrap_or(0);
        let resolved = match percent.and_then(Self::clamp) {
            Some(value) => value,
            None => floor.max(self.placeholder),
        };
        if resolved < floor {
            return None;
        }
        self.last_percent = Some(resolved);
        Some(ProgressEvent::Progress {
            percent: resolved,
            message: message.unwrap_or_default(),
        })
    }
}
