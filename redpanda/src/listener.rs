//! Inbound request listener.

use crate::headers::correlation_context;
use crate::offsets::OffsetTracker;
use futures::StreamExt;
use post_bridge_core::dispatcher::Dispatcher;
use post_bridge_core::store::PostStore;
use post_bridge_core::transport::{ReplyPublisher, TransportError};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default inbound topic.
pub const DEFAULT_INBOUND_TOPIC: &str = "InTopic";

/// Default consumer group.
pub const DEFAULT_CONSUMER_GROUP: &str = "posts-group";

/// Consumes post requests from the inbound topic and serves them.
///
/// **At-least-once delivery** with manual offset commits: a message counts as
/// done once the dispatcher has handled it and any reply has been attempted.
/// Each partition's committed position never passes its lowest message still
/// in flight. If the process stops in between, that message and any later
/// ones are redelivered. Requests are not deduplicated.
///
/// Up to `concurrency` messages are in flight at once, with no ordering
/// guarantee between them.
///
/// # Example
///
/// ```no_run
/// use post_bridge_redpanda::PostRequestListener;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let listener = PostRequestListener::builder()
///     .brokers("localhost:9092")
///     .topic("InTopic")
///     .consumer_group("posts-group")
///     .concurrency(32)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct PostRequestListener {
    consumer: StreamConsumer,
    topic: String,
    consumer_group: String,
    concurrency: usize,
}

impl PostRequestListener {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> PostRequestListenerBuilder {
        PostRequestListenerBuilder::default()
    }

    /// The inbound topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Serve requests until the stream ends.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SubscriptionFailed`] if the topic cannot be subscribed.
    pub async fn run<S: PostStore>(
        &self,
        dispatcher: &Dispatcher<S>,
        publisher: &dyn ReplyPublisher,
    ) -> Result<(), TransportError> {
        self.run_until(dispatcher, publisher, std::future::pending::<()>())
            .await
    }

    /// Serve requests until `shutdown` resolves.
    ///
    /// In-flight messages are abandoned on shutdown. Commits never pass them,
    /// so they are redelivered.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SubscriptionFailed`] if the topic cannot be subscribed.
    pub async fn run_until<S, F>(
        &self,
        dispatcher: &Dispatcher<S>,
        publisher: &dyn ReplyPublisher,
        shutdown: F,
    ) -> Result<(), TransportError>
    where
        S: PostStore,
        F: Future<Output = ()>,
    {
        self.consumer.subscribe(&[self.topic.as_str()]).map_err(|e| {
            TransportError::SubscriptionFailed {
                topic: self.topic.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(
            topic = %self.topic,
            consumer_group = %self.consumer_group,
            concurrency = self.concurrency,
            partition = %dispatcher.partition(),
            "Listening for post requests"
        );

        let tracker = Mutex::new(OffsetTracker::default());
        let tracker = &tracker;

        let processing = self
            .consumer
            .stream()
            .for_each_concurrent(self.concurrency, |received| {
                // Registered in stream order, before any later message can complete.
                if let Ok(message) = &received {
                    lock(tracker).begin(message.topic(), message.partition(), message.offset());
                }

                async move {
                    match received {
                        Ok(message) => self.process(dispatcher, publisher, tracker, &message).await,
                        Err(e) => {
                            tracing::warn!(topic = %self.topic, error = %e, "Failed to receive message");
                        },
                    }
                }
            });

        tokio::select! {
            () = processing => tracing::info!(topic = %self.topic, "Request stream ended"),
            () = shutdown => tracing::info!(topic = %self.topic, "Listener shutting down"),
        }

        Ok(())
    }

    async fn process<S: PostStore>(
        &self,
        dispatcher: &Dispatcher<S>,
        publisher: &dyn ReplyPublisher,
        tracker: &Mutex<OffsetTracker>,
        message: &BorrowedMessage<'_>,
    ) {
        let context = correlation_context(message.headers());
        let payload = message.payload().unwrap_or_default();

        tracing::trace!(
            topic = message.topic(),
            partition = message.partition(),
            offset = message.offset(),
            addressed = context.is_addressed(),
            "Received post request"
        );

        // Publish failures are logged by the publisher; the message still counts as done.
        if let Err(e) = dispatcher.serve(payload, &context, publisher).await {
            tracing::debug!(
                partition = message.partition(),
                offset = message.offset(),
                error = %e,
                "Request handled without a delivered reply"
            );
        }

        let position = lock(tracker).complete(message.topic(), message.partition(), message.offset());
        if let Some(position) = position {
            self.commit(message, position);
        }
    }

    fn commit(&self, message: &BorrowedMessage<'_>, position: i64) {
        let mut offsets = TopicPartitionList::new();
        let committed = offsets
            .add_partition_offset(message.topic(), message.partition(), Offset::Offset(position))
            .and_then(|()| self.consumer.commit(&offsets, CommitMode::Async));

        if let Err(e) = committed {
            tracing::warn!(
                topic = message.topic(),
                partition = message.partition(),
                position,
                error = %e,
                "Failed to commit offset (messages may be redelivered)"
            );
        }
    }
}

fn lock(tracker: &Mutex<OffsetTracker>) -> MutexGuard<'_, OffsetTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`PostRequestListener`].
#[derive(Default)]
pub struct PostRequestListenerBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    consumer_group: Option<String>,
    auto_offset_reset: Option<String>,
    concurrency: Option<usize>,
}

impl PostRequestListenerBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the inbound topic.
    ///
    /// Default: `InTopic`
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the consumer group. Instances in one group share the inbound partitions.
    ///
    /// Default: `posts-group`
    #[must_use]
    pub fn consumer_group(mut self, consumer_group: impl Into<String>) -> Self {
        self.consumer_group = Some(consumer_group.into());
        self
    }

    /// Where a new consumer group starts reading: `earliest`, `latest` or `error`.
    ///
    /// Default: `latest`
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Maximum number of messages handled at once. Zero is treated as one.
    ///
    /// Default: 16
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Build the listener.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if brokers are not set or
    /// the consumer cannot be created.
    pub fn build(self) -> Result<PostRequestListener, TransportError> {
        let brokers = self
            .brokers
            .ok_or_else(|| TransportError::ConnectionFailed("Brokers not configured".to_string()))?;
        let topic = self
            .topic
            .unwrap_or_else(|| DEFAULT_INBOUND_TOPIC.to_string());
        let consumer_group = self
            .consumer_group
            .unwrap_or_else(|| DEFAULT_CONSUMER_GROUP.to_string());
        let auto_offset_reset = self.auto_offset_reset.unwrap_or_else(|| "latest".to_string());
        let concurrency = self.concurrency.unwrap_or(16).max(1);

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("group.id", &consumer_group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &auto_offset_reset)
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to create consumer: {e}"))
            })?;

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            consumer_group = %consumer_group,
            auto_offset_reset = %auto_offset_reset,
            concurrency,
            "Post request listener created"
        );

        Ok(PostRequestListener {
            consumer,
            topic,
            consumer_group,
            concurrency,
        })
    }
}
