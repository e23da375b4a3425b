//! # Post Bridge Testing
//!
//! In-memory collaborators for exercising the dispatcher without a broker or
//! a database:
//!
//! - [`InMemoryPostStore`]: `HashMap`-backed [`PostStore`](post_bridge_core::PostStore)
//!   with failure injection
//! - [`RecordingReplyPublisher`]: captures outgoing replies
//! - [`fixtures`]: request and context builders used across tests

mod publisher;
mod store;

pub use publisher::RecordingReplyPublisher;
pub use store::InMemoryPostStore;

/// Request builders shared by tests.
pub mod fixtures {
    use post_bridge_core::envelope::{InboundEnvelope, Method};
    use post_bridge_core::post::PostRequest;
    use post_bridge_core::transport::CorrelationContext;

    /// Partition used by test dispatchers.
    pub const PARTITION: &str = "BY";

    /// Reply topic used by addressed test requests.
    pub const REPLY_TOPIC: &str = "OutTopic";

    /// An envelope for `method` carrying `payload`.
    #[must_use]
    pub fn envelope(method: &str, payload: Option<PostRequest>) -> InboundEnvelope {
        InboundEnvelope::new(Method::parse(method), payload)
    }

    /// A fully addressed context with the given correlation token.
    #[must_use]
    pub fn addressed(correlation_id: &str) -> CorrelationContext {
        CorrelationContext::new(REPLY_TOPIC, correlation_id)
    }

    /// Install a test subscriber that prints `tracing` output on failure.
    ///
    /// Safe to call from every test; only the first call installs.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "post_bridge_core=debug".into()),
            )
            .try_init();
    }
}

pub use fixtures::init_tracing;
