//! Reply publisher backed by an rdkafka producer.

use crate::headers::reply_headers;
use post_bridge_core::transport::{OutgoingMessage, ReplyPublisher, TransportError};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Publishes outcome envelopes to caller-chosen reply topics.
///
/// Each reply is JSON-encoded and carries the caller's correlation token in
/// the `kafka_correlationId` header. Send failures are returned, never
/// retried.
///
/// # Example
///
/// ```no_run
/// use post_bridge_redpanda::RedpandaReplyPublisher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let publisher = RedpandaReplyPublisher::builder()
///     .brokers("localhost:9092")
///     .producer_acks("all")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RedpandaReplyPublisher {
    producer: FutureProducer,
    timeout: Duration,
}

impl RedpandaReplyPublisher {
    /// Create a publisher with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if the producer cannot be created.
    pub fn new(brokers: &str) -> Result<Self, TransportError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> RedpandaReplyPublisherBuilder {
        RedpandaReplyPublisherBuilder::default()
    }
}

/// Builder for [`RedpandaReplyPublisher`].
#[derive(Default)]
pub struct RedpandaReplyPublisherBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaReplyPublisherBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1" or "all".
    ///
    /// Default: "1"
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the send timeout.
    ///
    /// Default: 5 seconds
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the publisher.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created.
    pub fn build(self) -> Result<RedpandaReplyPublisher, TransportError> {
        let brokers = self
            .brokers
            .ok_or_else(|| TransportError::ConnectionFailed("Brokers not configured".to_string()))?;
        let acks = self.producer_acks.as_deref().unwrap_or("1");

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", acks)
            .create()
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to create producer: {e}"))
            })?;

        tracing::info!(brokers = %brokers, acks, "Reply publisher created");

        Ok(RedpandaReplyPublisher {
            producer,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        })
    }
}

impl ReplyPublisher for RedpandaReplyPublisher {
    fn publish_reply(
        &self,
        message: &OutgoingMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + '_>> {
        let message = message.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let payload = message
                .envelope
                .to_vec()
                .map_err(|e| TransportError::EncodeFailed(e.to_string()))?;

            let record = FutureRecord::<(), _>::to(&message.destination)
                .payload(&payload)
                .headers(reply_headers(&message));

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %message.destination,
                        partition,
                        offset,
                        status = message.envelope.status().as_str(),
                        "Reply published"
                    );
                    metrics::counter!("post_bridge.replies.published").increment(1);
                    Ok(())
                },
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %message.destination,
                        error = %kafka_error,
                        "Failed to publish reply"
                    );
                    metrics::counter!("post_bridge.replies.failed").increment(1);
                    Err(TransportError::PublishFailed {
                        topic: message.destination.clone(),
                        reason: kafka_error.to_string(),
                    })
                },
            }
        })
    }
}
