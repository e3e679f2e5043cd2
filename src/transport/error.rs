//! Transport error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Connection-level failure with caller location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Transport error: {} at {}:{}", message, file, line)]
pub struct TransportError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TransportError {
    /// Creates a new transport error with caller location tracking.
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

impl From<reqwest::Error> for TransportError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("Event stream request failed: {}", err))
    }
}

impl From<crate::protocol::ProtocolError> for TransportError {
    #[track_caller]
    fn from(err: crate::protocol::ProtocolError) -> Self {
        Self::new(err.message)
    }
}
