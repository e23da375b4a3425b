//! Error types for dispatching and the programmatic post API.

use crate::store::StoreError;
use thiserror::Error;

/// Result type alias for post operations.
pub type Result<T> = std::result::Result<T, PostError>;

/// Failures raised while serving a post request.
///
/// On the bus path these stay structured until the dispatcher boundary,
/// where they are rendered into a DECLINE outcome. The programmatic
/// [`PostService`](crate::service::PostService) returns them as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    /// No post exists under the deployment partition with this id.
    ///
    /// Displays as the bare id so callers can surface it as a message.
    #[error("{0}")]
    NotFound(i64),

    /// A field required by the requested operation was absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The inbound bytes were not a valid request envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_bare_id() {
        assert_eq!(PostError::NotFound(42).to_string(), "42");
    }

    #[test]
    fn store_errors_keep_their_description() {
        let err = PostError::from(StoreError::DatabaseError("connection reset".to_string()));
        assert_eq!(err.to_string(), "Database error: connection reset");
    }
}
