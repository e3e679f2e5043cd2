//! Publish/subscribe transport carrying [`EventMessage`]s.

mod error;
mod local;
mod sse;

use tokio::sync::mpsc;

use crate::protocol::EventMessage;

pub use error::TransportError;
pub use local::LocalHub;
pub use sse::{SseDecoder, SseTransport};

/// Broadcast topic every lobby shares.
pub const DEFAULT_TOPIC: &str = "labyrinth";

/// What a subscription delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The subscription is live.
    Connected,
    /// One raw frame, expected to hold an `EventMessage`.
    Frame(String),
    /// Connection-level failure. The subscription is over.
    Error(String),
    /// The stream ended cleanly.
    Closed,
}

/// A single persistent subscription plus a publish path.
///
/// Implementations never retry; a failed subscription ends with
/// [`TransportEvent::Error`] and the caller decides whether to resubscribe.
#[async_trait::async_trait]
pub trait EventTransport: Send + Sync {
    /// Opens a subscription to `topic`.
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<TransportEvent>, TransportError>;

    /// Broadcasts `message` to every subscriber of the shared topic.
    async fn publish(&self, message: &EventMessage) -> Result<(), TransportError>;
}
