//! Scrape tracker core: pure job lifecycle state machine and progress normalization.
mod decode;
mod event;
mod msg;
mod normalize;
mod request;
mod state;
mod update;

pub use decode::{DecodedLine, LineDecoder, StreamRecord};
pub use event::{FailureReason, JobId, ProgressEvent};
pub use msg::{Msg, RawUpdate};
pub use normalize::{Normalizer, DEFAULT_PLACEHOLDER_PERCENT};
pub use request::{JobOptions, JobRequest, RequestError, TransportPreference};
pub use state::{JobState, TransportKind};
pub use update::{update, JobRecord};
