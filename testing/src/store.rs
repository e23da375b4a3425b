//! In-memory post store.

use post_bridge_core::post::{Post, PostKey};
use post_bridge_core::store::{PostStore, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// `HashMap`-backed [`PostStore`] for fast, deterministic tests.
///
/// Every operation takes the lock once, so each call is atomic with respect
/// to concurrent callers. Clones share the same data.
///
/// # Example
///
/// ```
/// use post_bridge_core::post::{Post, PostRequest};
/// use post_bridge_core::store::PostStore;
/// use post_bridge_testing::InMemoryPostStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryPostStore::new();
/// store.upsert(Post::from_request(&PostRequest::new(1, "hi"), "BY", 1)).await?;
///
/// assert!(store.find_by_id("BY", 1).await?.is_some());
/// assert!(store.find_by_id("PL", 1).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryPostStore {
    posts: Arc<RwLock<HashMap<PostKey, Post>>>,
    failure: Arc<RwLock<Option<StoreError>>>,
}

impl InMemoryPostStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `posts`.
    #[must_use]
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let map = posts.into_iter().map(|post| (post.key.clone(), post)).collect();
        Self {
            posts: Arc::new(RwLock::new(map)),
            failure: Arc::default(),
        }
    }

    /// Make every subsequent operation fail with `error`.
    pub fn fail_with(&self, error: StoreError) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = Some(error);
        }
    }

    /// Stop injecting failures.
    pub fn recover(&self) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = None;
        }
    }

    /// Snapshot of a stored post, bypassing failure injection.
    #[must_use]
    pub fn get(&self, partition: &str, id: i64) -> Option<Post> {
        self.posts
            .read()
            .ok()?
            .get(&PostKey::new(partition, id))
            .cloned()
    }

    /// Number of stored posts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.read().map(|posts| posts.len()).unwrap_or_default()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        let failure = self
            .failure
            .read()
            .map_err(|_| StoreError::Unavailable("failure lock poisoned".to_string()))?;
        failure.clone().map_or(Ok(()), Err)
    }

    fn with_read<T>(&self, f: impl FnOnce(&HashMap<PostKey, Post>) -> T) -> Result<T, StoreError> {
        self.check()?;
        let posts = self
            .posts
            .read()
            .map_err(|_| StoreError::Unavailable("post lock poisoned".to_string()))?;
        Ok(f(&posts))
    }

    fn with_write<T>(
        &self,
        f: impl FnOnce(&mut HashMap<PostKey, Post>) -> T,
    ) -> Result<T, StoreError> {
        self.check()?;
        let mut posts = self
            .posts
            .write()
            .map_err(|_| StoreError::Unavailable("post lock poisoned".to_string()))?;
        Ok(f(&mut posts))
    }
}

impl PostStore for InMemoryPostStore {
    fn upsert(&self, post: Post) -> impl Future<Output = Result<Post, StoreError>> + Send {
        async move {
            self.with_write(|posts| {
                posts.insert(post.key.clone(), post.clone());
                post
            })
        }
    }

    fn find_by_id(
        &self,
        partition: &str,
        id: i64,
    ) -> impl Future<Output = Result<Option<Post>, StoreError>> + Send {
        let key = PostKey::new(partition, id);
        async move { self.with_read(|posts| posts.get(&key).cloned()) }
    }

    fn find_all(&self) -> impl Future<Output = Result<Vec<Post>, StoreError>> + Send {
        async move { self.with_read(|posts| posts.values().cloned().collect()) }
    }

    fn delete(&self, post: &Post) -> impl Future<Output = Result<(), StoreError>> + Send {
        let key = post.key.clone();
        async move {
            self.with_write(|posts| {
                posts.remove(&key);
            })
        }
    }

    fn delete_by_id(
        &self,
        partition: &str,
        id: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let key = PostKey::new(partition, id);
        async move {
            self.with_write(|posts| {
                posts.remove(&key);
            })
        }
    }
}
