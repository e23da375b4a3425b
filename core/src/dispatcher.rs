//! Request dispatch and correlation.
//!
//! [`Dispatcher::handle`] is the single entry point for one inbound message.
//! It routes the decoded [`Method`] to the [`PostStore`], turns the result
//! (or any failure) into an [`OutboundEnvelope`], and addresses it back to
//! the caller when the message carried a reply destination and a
//! correlation token.
//!
//! # Routing
//!
//! | Method   | Store calls                       | Outcome                                  |
//! |----------|-----------------------------------|------------------------------------------|
//! | `POST`   | upsert                            | never replies on success                 |
//! | `GET`    | find-by-id; find-all if no payload| miss → DECLINE with the id               |
//! | `PUT`    | upsert                            | APPROVE with the written post            |
//! | `DELETE` | find-by-id, then delete           | miss → DECLINE `Post not found`          |
//! | other    | none                              | DECLINE `Unsupported method: <m>`        |
//!
//! Every failure is converted to DECLINE `Error: <description>` at one
//! boundary, so nothing escapes to the listener loop.
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = Dispatcher::new(Arc::new(store), "BY");
//!
//! let envelope = InboundEnvelope::new(Method::Read, Some(PostRequest::with_id(42)));
//! let context = CorrelationContext::new("OutTopic", "req-1");
//!
//! if let Some(reply) = dispatcher.handle(envelope, &context).await {
//!     publisher.publish_reply(&reply).await?;
//! }
//! ```

use crate::envelope::{InboundEnvelope, Method, OutboundEnvelope, OutcomeBody};
use crate::error::{PostError, Result};
use crate::post::{Post, PostRequest};
use crate::store::PostStore;
use crate::transport::{CorrelationContext, OutgoingMessage, ReplyPublisher, TransportError};
use std::sync::Arc;

/// Message returned when a DELETE targets a post that does not exist.
pub const POST_NOT_FOUND: &str = "Post not found";

/// What the dispatcher decided to do with a routed request.
enum Disposition {
    /// The request succeeded and the caller gets no reply (CREATE).
    Silent(Post),
    /// The request produced an outcome for the caller.
    Reply(OutboundEnvelope),
}

/// Routes inbound post requests to a [`PostStore`].
///
/// Holds no mutable state; one instance can serve any number of messages
/// concurrently.
pub struct Dispatcher<S> {
    store: Arc<S>,
    partition: String,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            partition: self.partition.clone(),
        }
    }
}

impl<S: PostStore> Dispatcher<S> {
    /// Create a dispatcher that scopes keyed operations to `partition`.
    #[must_use]
    pub fn new(store: Arc<S>, partition: impl Into<String>) -> Self {
        Self {
            store,
            partition: partition.into(),
        }
    }

    /// The deployment partition injected into every keyed operation.
    #[must_use]
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Handle one decoded request.
    ///
    /// Returns the message to transmit, or `None` when nothing should be sent:
    /// either the request carried incomplete addressing, or it was a
    /// successful CREATE.
    pub async fn handle(
        &self,
        envelope: InboundEnvelope,
        context: &CorrelationContext,
    ) -> Option<OutgoingMessage> {
        let method = envelope.method.clone();

        let outcome = match self.route(envelope).await {
            Ok(Disposition::Silent(post)) => {
                tracing::debug!(
                    method = %method,
                    partition = %post.key.partition,
                    id = post.key.id,
                    "Post written, no reply for create"
                );
                record(&method, "APPROVE");
                return None;
            },
            Ok(Disposition::Reply(outcome)) => outcome,
            Err(error) => {
                tracing::warn!(method = %method, error = %error, "Post request failed");
                failure(&error)
            },
        };

        record(&method, outcome.status().as_str());
        self.emit(outcome, context)
    }

    /// Decode raw message bytes and handle the request.
    ///
    /// Bytes that are not an envelope produce a DECLINE outcome, which is
    /// sent if the message was addressed.
    pub async fn handle_bytes(
        &self,
        payload: &[u8],
        context: &CorrelationContext,
    ) -> Option<OutgoingMessage> {
        match InboundEnvelope::from_slice(payload) {
            Ok(envelope) => self.handle(envelope, context).await,
            Err(error) => {
                tracing::warn!(error = %error, bytes = payload.len(), "Undecodable post request");
                metrics::counter!("post_bridge.requests", "method" => "MALFORMED", "status" => "DECLINE")
                    .increment(1);
                self.emit(failure(&error), context)
            },
        }
    }

    /// Handle raw message bytes and publish the reply, if any.
    ///
    /// Returns `Ok(true)` when a reply was published and `Ok(false)` when
    /// there was nothing to send.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if publishing the reply failed. The request
    /// itself has already been applied to the store at that point.
    pub async fn serve(
        &self,
        payload: &[u8],
        context: &CorrelationContext,
        publisher: &dyn ReplyPublisher,
    ) -> std::result::Result<bool, TransportError> {
        let Some(reply) = self.handle_bytes(payload, context).await else {
            return Ok(false);
        };

        publisher.publish_reply(&reply).await?;
        tracing::debug!(
            destination = %reply.destination,
            status = reply.envelope.status().as_str(),
            "Reply published"
        );
        Ok(true)
    }

    async fn route(&self, envelope: InboundEnvelope) -> Result<Disposition> {
        let InboundEnvelope { method, payload } = envelope;

        match method {
            Method::Create => {
                let written = self.write(payload).await?;
                Ok(Disposition::Silent(written))
            },
            Method::Read => {
                // A present payload always means a single lookup.
                let outcome = match payload {
                    Some(request) => self.read_one(require_id(Some(&request))?).await?,
                    None => self.read_all().await?,
                };
                Ok(Disposition::Reply(outcome))
            },
            Method::Update => {
                let written = self.write(payload).await?;
                Ok(Disposition::Reply(OutboundEnvelope::approve(
                    OutcomeBody::Post(written.to_response()),
                )))
            },
            Method::Delete => {
                let id = require_id(payload.as_ref())?;
                Ok(Disposition::Reply(self.delete(id).await?))
            },
            Method::Unknown(raw) => Ok(Disposition::Reply(OutboundEnvelope::decline(format!(
                "Unsupported method: {raw}"
            )))),
        }
    }

    /// Shared write path for CREATE and UPDATE: no existence check.
    async fn write(&self, payload: Option<PostRequest>) -> Result<Post> {
        let request = payload.ok_or(PostError::MissingField("payload"))?;
        let id = require_id(Some(&request))?;
        let post = Post::from_request(&request, self.partition.as_str(), id);

        tracing::debug!(partition = %self.partition, id, "Upserting post");
        Ok(self.store.upsert(post).await?)
    }

    async fn read_one(&self, id: i64) -> Result<OutboundEnvelope> {
        let outcome = match self.store.find_by_id(&self.partition, id).await? {
            Some(post) => OutboundEnvelope::approve(OutcomeBody::Post(post.to_response())),
            None => OutboundEnvelope::decline(PostError::NotFound(id).to_string()),
        };
        Ok(outcome)
    }

    async fn read_all(&self) -> Result<OutboundEnvelope> {
        // Not scoped to the deployment partition.
        let posts = self.store.find_all().await?;
        Ok(OutboundEnvelope::approve(OutcomeBody::Posts(
            posts.iter().map(Post::to_response).collect(),
        )))
    }

    async fn delete(&self, id: i64) -> Result<OutboundEnvelope> {
        let Some(post) = self.store.find_by_id(&self.partition, id).await? else {
            return Ok(OutboundEnvelope::decline(POST_NOT_FOUND));
        };

        self.store.delete(&post).await?;
        tracing::debug!(partition = %self.partition, id, "Post deleted");
        Ok(OutboundEnvelope::approve(OutcomeBody::Post(post.to_response())))
    }

    fn emit(&self, outcome: OutboundEnvelope, context: &CorrelationContext) -> Option<OutgoingMessage> {
        let message = context.address(outcome);
        if message.is_none() {
            tracing::trace!(partition = %self.partition, "No reply address, outcome dropped");
        }
        message
    }
}

fn require_id(payload: Option<&PostRequest>) -> Result<i64> {
    payload
        .ok_or(PostError::MissingField("payload"))?
        .id
        .ok_or(PostError::MissingField("id"))
}

fn failure(error: &PostError) -> OutboundEnvelope {
    OutboundEnvelope::decline(format!("Error: {error}"))
}

fn record(method: &Method, status: &'static str) {
    let method = match method {
        Method::Unknown(_) => "UNKNOWN",
        Method::Create => "POST",
        Method::Read => "GET",
        Method::Update => "PUT",
        Method::Delete => "DELETE",
    };
    metrics::counter!("post_bridge.requests", "method" => method, "status" => status).increment(1);
}
