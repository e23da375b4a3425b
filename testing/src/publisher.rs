//! Reply publisher that records instead of sending.

use post_bridge_core::transport::{OutgoingMessage, ReplyPublisher, TransportError};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// [`ReplyPublisher`] that keeps every reply in memory.
///
/// Set [`RecordingReplyPublisher::failing`] to simulate a broker that
/// rejects replies.
#[derive(Clone, Debug, Default)]
pub struct RecordingReplyPublisher {
    published: Arc<Mutex<Vec<OutgoingMessage>>>,
    failing: bool,
}

impl RecordingReplyPublisher {
    /// Create a publisher that accepts every reply.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a publisher that rejects every reply.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            published: Arc::default(),
            failing: true,
        }
    }

    /// Replies published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<OutgoingMessage> {
        self.published
            .lock()
            .map(|published| published.clone())
            .unwrap_or_default()
    }

    /// Replies published to `destination`.
    #[must_use]
    pub fn published_to(&self, destination: &str) -> Vec<OutgoingMessage> {
        self.published()
            .into_iter()
            .filter(|message| message.destination == destination)
            .collect()
    }
}

impl ReplyPublisher for RecordingReplyPublisher {
    fn publish_reply(
        &self,
        message: &OutgoingMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + '_>> {
        let message = message.clone();

        Box::pin(async move {
            if self.failing {
                return Err(TransportError::PublishFailed {
                    topic: message.destination,
                    reason: "publisher configured to fail".to_string(),
                });
            }

            self.published
                .lock()
                .map_err(|_| TransportError::PublishFailed {
                    topic: message.destination.clone(),
                    reason: "recording lock poisoned".to_string(),
                })?
                .push(message);
            Ok(())
        })
    }
}
