use serde::Deserialize;
use serde_json::Value;

use crate::RawUpdate;

/// One newline-delimited progress record from a streamed response body.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StreamRecord {
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl StreamRecord {
    /// Progress (if any) comes before the terminal update. `error` wins over
    /// `result`. A record with none of the fields yields nothing.
    pub fn into_updates(self) -> Vec<RawUpdate> {
        let mut updates = Vec::with_capacity(2);
        if self.progress.is_some() || self.message.is_some() {
            updates.push(RawUpdate::Progress {
                percent: self.progress,
                message: self.message,
            });
        }
        if let Some(error) = self.error {
            updates.push(RawUpdate::Failed(error));
        } else if let Some(result) = self.result {
            updates.push(RawUpdate::Completed(result));
        }
        updates
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    Record(StreamRecord),
    /// A non-empty line that did not parse; the caller logs and drops it.
    Malformed { line: String, error: String },
}

/// Splits a chunked body into lines and parses each one independently.
///
/// A trailing fragment without a newline is kept until the next chunk
/// arrives (or `finish` is called), so records split across chunk
/// boundaries are reassembled.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<DecodedLine> {
        self.buffer.extend_from_slice(chunk);
        let mut decoded = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            decoded.extend(decode_line(&line[..pos]));
        }
        decoded
    }

    /// Decodes whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<DecodedLine> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest).into_iter().collect()
    }

    /// Discards any buffered partial line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> Option<DecodedLine> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim(),
        Err(err) => {
            return Some(DecodedLine::Malformed {
                line: String::from_utf8_lossy(raw).into_owned(),
                error: err.to_string(),
            })
        }
    };
    if line.is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<StreamRecord>(line) {
        Ok(record) => DecodedLine::Record(record),
        Err(err) => DecodedLine::Malformed {
            line: line.to_string(),
            error: err.to_string(),
        },
    })
}
