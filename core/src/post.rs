//! The post entity and its wire shapes.
//!
//! A [`Post`] is the persisted record. Its identity is a [`PostKey`]: the
//! deployment's partition tag plus a numeric id. Callers never send the
//! partition; it is injected when a [`PostRequest`] is turned into a [`Post`].
//!
//! # Example
//!
//! ```
//! use post_bridge_core::post::{Post, PostRequest};
//!
//! let request = PostRequest::new(42, "hello");
//! let post = Post::from_request(&request, "BY", 42);
//!
//! assert_eq!(post.key.partition, "BY");
//! assert_eq!(post.key.id, 42);
//! assert_eq!(post.to_response().content, "hello");
//! ```

use serde::{Deserialize, Serialize};

/// Composite identity of a post.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostKey {
    /// Deployment-scoped partition tag (for example a country code).
    pub partition: String,
    /// Numeric identifier, unique within the partition.
    pub id: i64,
}

impl PostKey {
    /// Create a key from a partition tag and an id.
    #[must_use]
    pub fn new(partition: impl Into<String>, id: i64) -> Self {
        Self {
            partition: partition.into(),
            id,
        }
    }
}

/// A persisted post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Composite identity, immutable once assigned.
    pub key: PostKey,
    /// Issue this post belongs to, if any.
    pub issue_id: Option<i64>,
    /// Post body.
    pub content: String,
}

impl Post {
    /// Build a post from a request, assigning the given partition and id.
    ///
    /// Any id carried by the request is ignored in favour of `id`.
    #[must_use]
    pub fn from_request(request: &PostRequest, partition: impl Into<String>, id: i64) -> Self {
        Self {
            key: PostKey::new(partition, id),
            issue_id: request.issue_id,
            content: request.content.clone(),
        }
    }

    /// Map this post to its response shape.
    #[must_use]
    pub fn to_response(&self) -> PostResponse {
        PostResponse {
            id: self.key.id,
            issue_id: self.issue_id,
            content: self.content.clone(),
        }
    }
}

/// Request-shaped post as sent by callers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    /// Caller-supplied id. Required for every bus operation that targets one post.
    #[serde(default)]
    pub id: Option<i64>,
    /// Issue this post belongs to.
    #[serde(default)]
    pub issue_id: Option<i64>,
    /// Post body.
    #[serde(default, alias = "text")]
    pub content: String,
}

impl PostRequest {
    /// Create a request carrying an id and content.
    #[must_use]
    pub fn new(id: i64, content: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            issue_id: None,
            content: content.into(),
        }
    }

    /// Create a request that only names an id, as used by lookups and deletes.
    #[must_use]
    pub const fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            issue_id: None,
            content: String::new(),
        }
    }

    /// Set the issue id.
    #[must_use]
    pub fn issue_id(mut self, issue_id: i64) -> Self {
        self.issue_id = Some(issue_id);
        self
    }
}

/// Response-shaped post returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    /// Post id.
    pub id: i64,
    /// Issue this post belongs to.
    pub issue_id: Option<i64>,
    /// Post body.
    pub content: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn from_request_overrides_caller_id() {
        let request = PostRequest::new(7, "body").issue_id(3);
        let post = Post::from_request(&request, "PL", 99);

        assert_eq!(post.key, PostKey::new("PL", 99));
        assert_eq!(post.issue_id, Some(3));
        assert_eq!(post.content, "body");
    }

    #[test]
    fn request_accepts_text_alias() {
        let request: PostRequest = serde_json::from_str(r#"{"id":42,"text":"hi"}"#).unwrap();

        assert_eq!(request.id, Some(42));
        assert_eq!(request.content, "hi");
        assert_eq!(request.issue_id, None);
    }

    #[test]
    fn response_uses_camel_case() {
        let post = Post::from_request(&PostRequest::new(1, "x").issue_id(5), "BY", 1);
        let json = serde_json::to_value(post.to_response()).unwrap();

        assert_eq!(json, serde_json::json!({"id": 1, "issueId": 5, "content": "x"}));
    }
}
