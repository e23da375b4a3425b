//! Correlation metadata and the reply publishing seam.
//!
//! Transport headers, not the business payload, carry the caller's reply
//! address and correlation token. They are read once per request into a
//! [`CorrelationContext`] and copied unchanged onto the
//! [`OutgoingMessage`]; they are never persisted.
//!
//! ```text
//! inbound headers ──► CorrelationContext ──► Dispatcher::handle
//!                                                  │
//!                                 Option<OutgoingMessage>
//!                                                  │
//!                                                  ▼
//!                                   ReplyPublisher::publish_reply
//! ```

use crate::envelope::OutboundEnvelope;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Header carrying the topic a reply should be sent to.
pub const REPLY_TOPIC_HEADER: &str = "kafka_replyTopic";

/// Header carrying the opaque correlation token.
pub const CORRELATION_ID_HEADER: &str = "kafka_correlationId";

/// Reply addressing extracted from an inbound message's headers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrelationContext {
    /// Raw reply destination header value.
    pub reply_to: Option<Vec<u8>>,
    /// Raw correlation token header value.
    pub correlation_id: Option<Vec<u8>>,
}

impl CorrelationContext {
    /// Context with both a reply destination and a correlation token.
    #[must_use]
    pub fn new(reply_to: impl Into<Vec<u8>>, correlation_id: impl Into<Vec<u8>>) -> Self {
        Self {
            reply_to: Some(reply_to.into()),
            correlation_id: Some(correlation_id.into()),
        }
    }

    /// Context for a message that carried no addressing headers.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            reply_to: None,
            correlation_id: None,
        }
    }

    /// Build a context from `(name, value)` header pairs.
    ///
    /// Unrelated headers are ignored. When a header repeats, the last value wins.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a [u8]>)>,
    {
        let mut context = Self::none();
        for (name, value) in headers {
            match name {
                REPLY_TOPIC_HEADER => context.reply_to = value.map(<[u8]>::to_vec),
                CORRELATION_ID_HEADER => context.correlation_id = value.map(<[u8]>::to_vec),
                _ => {},
            }
        }
        context
    }

    /// Whether both addressing headers are present.
    #[must_use]
    pub const fn is_addressed(&self) -> bool {
        self.reply_to.is_some() && self.correlation_id.is_some()
    }

    /// Wrap an outcome for the caller, or `None` if addressing is incomplete.
    #[must_use]
    pub fn address(&self, envelope: OutboundEnvelope) -> Option<OutgoingMessage> {
        let (Some(reply_to), Some(correlation_id)) = (&self.reply_to, &self.correlation_id) else {
            return None;
        };

        Some(OutgoingMessage {
            destination: String::from_utf8_lossy(reply_to).into_owned(),
            correlation_id: correlation_id.clone(),
            envelope,
        })
    }
}

/// An outcome addressed back to the waiting caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Reply topic.
    pub destination: String,
    /// Correlation token, unchanged from the request.
    pub correlation_id: Vec<u8>,
    /// The outcome.
    pub envelope: OutboundEnvelope,
}

/// Errors raised while publishing replies or running a listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not create a client or connect to the broker.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Could not subscribe to the inbound topic.
    #[error("Subscription failed for topic '{topic}': {reason}")]
    SubscriptionFailed {
        /// The inbound topic
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Could not encode a reply.
    #[error("Failed to encode reply: {0}")]
    EncodeFailed(String),

    /// The broker rejected or timed out a reply.
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The reply topic
        topic: String,
        /// The reason for failure
        reason: String,
    },
}

/// Sends addressed outcomes back to callers.
///
/// Delivery failures are reported to the caller of `publish_reply`, which
/// logs them; nothing at this layer retries.
pub trait ReplyPublisher: Send + Sync {
    /// Publish one reply to its destination with its correlation token.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::EncodeFailed`] or
    /// [`TransportError::PublishFailed`] if the reply could not be sent.
    fn publish_reply(
        &self,
        message: &OutgoingMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + '_>>;
}
