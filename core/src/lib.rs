//! # Post Bridge Core
//!
//! Request/response bridge between a message bus and a post record store.
//!
//! Callers publish an [`InboundEnvelope`] naming an operation and an optional
//! payload. The [`Dispatcher`] routes it to a [`PostStore`], builds an
//! [`OutboundEnvelope`] with an APPROVE/DECLINE [`Status`], and, when the
//! message carried a reply topic and correlation token, returns an
//! [`OutgoingMessage`] addressed back to the caller.
//!
//! ## Architecture
//!
//! ```text
//! bytes + headers
//!       │
//!       ▼
//! ┌──────────────┐   Method::{Create, Read, Update, Delete, Unknown}
//! │  Dispatcher  │──────────────────────────────┐
//! └──────┬───────┘                              ▼
//!        │                              ┌──────────────┐
//!        │ Option<OutgoingMessage>      │  PostStore   │ (partition, id)
//!        ▼                              └──────────────┘
//! ┌──────────────┐
//! │ReplyPublisher│
//! └──────────────┘
//! ```
//!
//! Transports live in `post-bridge-redpanda`, stores in
//! `post-bridge-postgres` and `post-bridge-testing`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod post;
pub mod service;
pub mod store;
pub mod transport;

pub use dispatcher::{Dispatcher, POST_NOT_FOUND};
pub use envelope::{InboundEnvelope, Method, OutboundEnvelope, OutcomeBody, Status};
pub use error::PostError;
pub use post::{Post, PostKey, PostRequest, PostResponse};
pub use service::PostService;
pub use store::{PostStore, StoreError};
pub use transport::{
    CORRELATION_ID_HEADER, CorrelationContext, OutgoingMessage, REPLY_TOPIC_HEADER,
    ReplyPublisher, TransportError,
};
