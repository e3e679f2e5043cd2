//! Server-sent events subscription over `reqwest` streaming.

use futures::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

use super::{EventTransport, TransportError, TransportEvent};
use crate::protocol::EventMessage;

const SUBSCRIBER_BUFFER: usize = 64;

/// Splits a byte stream into SSE event payloads.
///
/// Consecutive `data:` lines of one event are joined with `\n`; comments
/// and other fields are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk and returns every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        events
    }
}

/// Subscribes to `{events_url}/{topic}` and publishes by POSTing to the
/// same resource.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: Client,
    events_url: String,
    topic: String,
}

impl SseTransport {
    /// Creates a transport publishing on `topic`.
    pub fn new(client: Client, events_url: &str, topic: &str) -> Self {
        Self {
            client,
            events_url: events_url.trim_end_matches('/').to_string(),
            topic: topic.to_string(),
        }
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/{}", self.events_url, topic)
    }
}

#[async_trait::async_trait]
impl EventTransport for SseTransport {
    #[instrument(skip(self))]
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        let response = self
            .client
            .get(self.topic_url(topic))
            .header("accept", "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Event stream refused");
            return Err(TransportError::new(format!(
                "Event stream refused with status {}",
                status
            )));
        }

        info!(%topic, "Event stream connected");
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            if tx.send(TransportEvent::Connected).await.is_err() {
                return;
            }
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(error = %e, "Event stream failed");
                        let _ = tx
                            .send(TransportEvent::Error(format!("Event stream failed: {}", e)))
                            .await;
                        return;
                    }
                };
                for payload in decoder.feed(&bytes) {
                    trace!(len = payload.len(), "Event frame received");
                    if tx.send(TransportEvent::Frame(payload)).await.is_err() {
                        debug!("Subscriber dropped");
                        return;
                    }
                }
            }
            debug!("Event stream ended");
            let _ = tx.send(TransportEvent::Closed).await;
        });

        Ok(rx)
    }

    #[instrument(skip(self, message), fields(operation = %message.operation))]
    async fn publish(&self, message: &EventMessage) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.topic_url(&self.topic))
            .json(message)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Publish rejected");
            return Err(TransportError::new(format!(
                "Publish rejected with status {}",
                status
            )));
        }
        Ok(())
    }
}
