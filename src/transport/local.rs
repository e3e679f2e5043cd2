//! In-process broadcast hub.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, instrument, trace, warn};

use super::{EventTransport, TransportError, TransportEvent};
use crate::protocol::EventMessage;

const HUB_CAPACITY: usize = 256;
const SUBSCRIBER_BUFFER: usize = 64;

/// Shares one broadcast channel between every session in the process.
///
/// Clones publish to and subscribe from the same channel. Slow subscribers
/// lose frames, matching the at-most-once delivery of the real stream.
/// Frames are relayed verbatim; sessions that move should publish through
/// [`MemoryBackend`](crate::MemoryBackend), which resolves MOVEMENT targets.
#[derive(Debug, Clone)]
pub struct LocalHub {
    sender: broadcast::Sender<String>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends a raw frame. Frames with no listener are dropped.
    #[instrument(skip(self, frame))]
    pub fn broadcast_frame(&self, frame: String) {
        if self.sender.send(frame).is_err() {
            trace!("No subscribers, frame dropped");
        }
    }

    /// Serializes and sends `message`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the message cannot be serialized.
    pub fn broadcast(&self, message: &EventMessage) -> Result<(), TransportError> {
        self.broadcast_frame(message.to_json()?);
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventTransport for LocalHub {
    #[instrument(skip(self))]
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        let mut receiver = self.sender.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let topic = topic.to_string();

        tokio::spawn(async move {
            if tx.send(TransportEvent::Connected).await.is_err() {
                return;
            }
            loop {
                let event = match receiver.recv().await {
                    Ok(frame) => TransportEvent::Frame(frame),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%topic, skipped, "Subscriber lagged, frames lost");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(%topic, "Hub closed");
                        let _ = tx.send(TransportEvent::Closed).await;
                        return;
                    }
                };
                if tx.send(event).await.is_err() {
                    debug!(%topic, "Subscriber dropped");
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn publish(&self, message: &EventMessage) -> Result<(), TransportError> {
        self.broadcast(message)
    }
}
