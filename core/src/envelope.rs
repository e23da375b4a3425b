//! Request and outcome envelopes carried over the bus.
//!
//! The inbound envelope names an operation with a string method. That string
//! is decoded exactly once into the closed [`Method`] enum; anything outside
//! the four known names becomes [`Method::Unknown`] and keeps its raw text.
//!
//! # Wire format
//!
//! ```text
//! inbound:  {"method": "GET", "payload": {"id": 42}}
//! outbound: {"body": {"id": 42, "issueId": null, "content": "hi"}, "status": "APPROVE"}
//!           {"body": "Post not found", "status": "DECLINE"}
//! ```

use crate::error::PostError;
use crate::post::{PostRequest, PostResponse};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested by an inbound envelope.
///
/// Matching is case-sensitive against `POST`, `GET`, `PUT` and `DELETE`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    /// `POST`: write a new post under a caller-supplied id.
    Create,
    /// `GET`: read one post by id, or all posts.
    Read,
    /// `PUT`: overwrite (or create) a post by id.
    Update,
    /// `DELETE`: remove a post by id.
    Delete,
    /// Any other method string, kept verbatim for diagnostics.
    Unknown(String),
}

impl Method {
    /// The wire name of this method.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "POST",
            Self::Read => "GET",
            Self::Update => "PUT",
            Self::Delete => "DELETE",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// Parse a wire method name. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for Method {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "POST" => Self::Create,
            "GET" => Self::Read,
            "PUT" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        match method {
            Method::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as published to the inbound topic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    /// Requested operation. A missing method decodes as an empty unknown method.
    #[serde(default)]
    pub method: Method,
    /// Request payload. Absent for "read all".
    #[serde(default, alias = "postRequestDTO")]
    pub payload: Option<PostRequest>,
}

impl InboundEnvelope {
    /// Create an envelope.
    #[must_use]
    pub const fn new(method: Method, payload: Option<PostRequest>) -> Self {
        Self { method, payload }
    }

    /// Decode an envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::MalformedEnvelope`] if the bytes are not a JSON
    /// envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PostError> {
        serde_json::from_slice(bytes).map_err(|e| PostError::MalformedEnvelope(e.to_string()))
    }

    /// Encode this envelope as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Two-valued outcome status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The operation succeeded.
    Approve,
    /// The operation was refused or failed; the body carries a message.
    Decline,
}

impl Status {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Decline => "DECLINE",
        }
    }
}

/// Body of an outcome envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeBody {
    /// A single post.
    Post(PostResponse),
    /// A sequence of posts.
    Posts(Vec<PostResponse>),
    /// A human-readable message.
    Message(String),
}

/// Response envelope sent back to a caller. Never mutated once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    body: OutcomeBody,
    status: Status,
}

impl OutboundEnvelope {
    /// Approve with the given body.
    #[must_use]
    pub const fn approve(body: OutcomeBody) -> Self {
        Self {
            body,
            status: Status::Approve,
        }
    }

    /// Decline with a message.
    #[must_use]
    pub fn decline(message: impl Into<String>) -> Self {
        Self {
            body: OutcomeBody::Message(message.into()),
            status: Status::Decline,
        }
    }

    /// Outcome body.
    #[must_use]
    pub const fn body(&self) -> &OutcomeBody {
        &self.body
    }

    /// Outcome status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Message carried by the body, if it is a message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            OutcomeBody::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Decode an envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the bytes are not an outcome envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode this envelope as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
