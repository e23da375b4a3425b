//! Redpanda transport for the post bridge.
//!
//! This crate connects the [`Dispatcher`](post_bridge_core::Dispatcher) to a
//! Kafka-compatible broker using rdkafka:
//!
//! - [`PostRequestListener`] consumes request envelopes from the inbound
//!   topic, reads the reply topic and correlation token from the message
//!   headers, and hands each message to the dispatcher.
//! - [`RedpandaReplyPublisher`] sends the dispatcher's outgoing messages to
//!   the caller's reply topic with the correlation token attached.
//!
//! # Architecture
//!
//! ```text
//!  caller ──► InTopic ──► PostRequestListener ──► Dispatcher ──► PostStore
//!    ▲                                               │
//!    │                                   Option<OutgoingMessage>
//!    │                                               ▼
//!    └──── reply topic ◄──── RedpandaReplyPublisher ◄┘
//! ```
//!
//! # Headers
//!
//! | Header                | Direction | Meaning                      |
//! |-----------------------|-----------|------------------------------|
//! | `kafka_replyTopic`    | inbound   | topic to send the reply to   |
//! | `kafka_correlationId` | both      | opaque token, echoed as-is   |
//!
//! Both inbound headers must be present for a reply to be sent.
//!
//! # Example
//!
//! ```no_run
//! use post_bridge_core::Dispatcher;
//! use post_bridge_redpanda::{PostRequestListener, RedpandaReplyPublisher};
//! # use post_bridge_core::PostStore;
//!
//! # async fn example<S: PostStore>(store: std::sync::Arc<S>) -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(store, "BY");
//! let publisher = RedpandaReplyPublisher::new("localhost:9092")?;
//! let listener = PostRequestListener::builder()
//!     .brokers("localhost:9092")
//!     .build()?;
//!
//! listener.run(&dispatcher, &publisher).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod headers;
mod listener;
mod offsets;
mod publisher;

pub use headers::{correlation_context, reply_headers};
pub use listener::{
    DEFAULT_CONSUMER_GROUP, DEFAULT_INBOUND_TOPIC, PostRequestListener, PostRequestListenerBuilder,
};
pub use publisher::{RedpandaReplyPublisher, RedpandaReplyPublisherBuilder};
