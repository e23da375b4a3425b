//! Programmatic post API for direct, non-bus callers.
//!
//! Unlike the [`Dispatcher`](crate::dispatcher::Dispatcher), failures here are
//! returned to the caller as [`PostError`] values instead of being folded
//! into an outcome envelope. A missing post is [`PostError::NotFound`].

use crate::error::{PostError, Result};
use crate::post::{Post, PostRequest, PostResponse};
use crate::store::PostStore;
use rand::Rng;
use std::sync::Arc;

/// Direct CRUD facade over a [`PostStore`].
pub struct PostService<S> {
    store: Arc<S>,
    partition: String,
}

impl<S> Clone for PostService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            partition: self.partition.clone(),
        }
    }
}

impl<S: PostStore> PostService<S> {
    /// Create a service bound to the deployment partition.
    #[must_use]
    pub fn new(store: Arc<S>, partition: impl Into<String>) -> Self {
        Self {
            store,
            partition: partition.into(),
        }
    }

    /// Store a new post under a freshly generated id.
    ///
    /// Any id on the request is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Store`] if the write fails.
    pub async fn save(&self, request: &PostRequest) -> Result<PostResponse> {
        let post = Post::from_request(request, self.partition.as_str(), next_post_id());
        let saved = self.store.upsert(post).await?;

        tracing::debug!(partition = %saved.key.partition, id = saved.key.id, "Post saved");
        Ok(saved.to_response())
    }

    /// Every stored post, across all partitions.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Store`] if the query fails.
    pub async fn find_all(&self) -> Result<Vec<PostResponse>> {
        let posts = self.store.find_all().await?;
        Ok(posts.iter().map(Post::to_response).collect())
    }

    /// Look up one post in the deployment partition.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::NotFound`] carrying `id` if no post exists, or
    /// [`PostError::Store`] if the query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<PostResponse> {
        self.store
            .find_by_id(&self.partition, id)
            .await?
            .map(|post| post.to_response())
            .ok_or(PostError::NotFound(id))
    }

    /// Delete one post in the deployment partition. Silent if absent.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Store`] if the delete fails.
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.store.delete_by_id(&self.partition, id).await?;
        Ok(())
    }

    /// Upsert a post under the caller-supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::MissingField`] if the request has no id, or
    /// [`PostError::Store`] if the write fails.
    pub async fn update(&self, request: &PostRequest) -> Result<PostResponse> {
        let id = request.id.ok_or(PostError::MissingField("id"))?;
        let post = Post::from_request(request, self.partition.as_str(), id);
        Ok(self.store.upsert(post).await?.to_response())
    }
}

/// Random positive id for posts created outside the bus.
#[must_use]
pub fn next_post_id() -> i64 {
    rand::thread_rng().gen_range(1..=i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_positive() {
        for _ in 0..1000 {
            assert!(next_post_id() > 0);
        }
    }
}
