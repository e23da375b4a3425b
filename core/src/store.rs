//! Record store abstraction for posts.
//!
//! The [`PostStore`] trait is the only seam between the dispatcher and
//! persistence. Records are keyed by `(partition, id)`; see
//! [`PostKey`](crate::post::PostKey).
//!
//! # Implementations
//!
//! - `InMemoryPostStore` in `post-bridge-testing` (tests, single process)
//! - `PostgresPostStore` in `post-bridge-postgres` (production)
//!
//! Each operation is atomic on its own. The trait makes no promise across
//! calls: the dispatcher's DELETE path reads and then deletes, and concurrent
//! writers to the same key are resolved by the backing store.

use crate::post::Post;
use std::future::Future;
use thiserror::Error;

/// Errors raised by a [`PostStore`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Query or connection failure in the backing database.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be mapped to a [`Post`].
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// The store's internal state is unusable (for example a poisoned lock).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed read/write access to persisted posts.
///
/// # Errors
///
/// Every operation returns [`StoreError`] when the backing store fails.
/// A missing record is never an error: lookups return `None` and deletes
/// of absent records are left to the backing store's semantics.
pub trait PostStore: Send + Sync {
    /// Insert or replace a post and return the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails. Overwriting an existing key
    /// is not a failure.
    fn upsert(&self, post: Post) -> impl Future<Output = Result<Post, StoreError>> + Send;

    /// Look up a post by its full identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_by_id(
        &self,
        partition: &str,
        id: i64,
    ) -> impl Future<Output = Result<Option<Post>, StoreError>> + Send;

    /// Return every stored post across all partitions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Post>, StoreError>> + Send;

    /// Remove a post by its full identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete(&self, post: &Post) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a post by key. Silent if no such post exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete_by_id(
        &self,
        partition: &str,
        id: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
