//! Wire protocol error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// A malformed event payload, with the location where it was rejected.
#[derive(Debug, Clone, Display, Error)]
#[display("Protocol error: {} at {}:{}", message, file, line)]
pub struct ProtocolError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolError {
    /// Creates a new protocol error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Malformed event message: {}", err))
    }
}
