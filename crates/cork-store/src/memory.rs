use std::sync::RwLock;

use async_trait::async_trait;
use cork_types::{NewPost, Post, PostId, PostMutation, PostPatch};

use crate::error::StoreResult;
use crate::traits::PostStore;

/// In-memory post store.
///
/// Intended for tests, demos and `memory://` deployments. Posts are held in
/// insertion order behind a `RwLock`; every mutation happens under the write
/// lock, so counter increments are atomic. Data is lost when the store is
/// dropped.
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
        }
    }

    /// Number of posts currently stored.
    pub fn len(&self) -> usize {
        self.posts.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.posts.read().expect("lock poisoned").is_empty()
    }

    fn modify<T>(
        &self,
        id: &PostId,
        f: impl FnOnce(&mut Post) -> StoreResult<T>,
    ) -> StoreResult<Option<T>> {
        let mut posts = self.posts.write().expect("lock poisoned");
        match posts.iter_mut().find(|p| p.id == *id) {
            Some(post) => f(post).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Post>> {
        Ok(self.posts.read().expect("lock poisoned").clone())
    }

    async fn get(&self, id: &PostId) -> StoreResult<Option<Post>> {
        let posts = self.posts.read().expect("lock poisoned");
        Ok(posts.iter().find(|p| p.id == *id).cloned())
    }

    async fn insert(&self, new: NewPost) -> StoreResult<Post> {
        let post = Post::create(PostId::new(), new);
        self.posts.write().expect("lock poisoned").push(post.clone());
        Ok(post)
    }

    async fn apply(&self, id: &PostId, mutation: PostMutation) -> StoreResult<Option<Post>> {
        self.modify(id, |post| {
            post.apply(mutation);
            Ok(post.clone())
        })
    }

    async fn update(&self, id: &PostId, patch: PostPatch) -> StoreResult<Option<Post>> {
        self.modify(id, |post| {
            post.apply_patch(patch)?;
            Ok(post.clone())
        })
    }

    async fn delete(&self, id: &PostId) -> StoreResult<bool> {
        let mut posts = self.posts.write().expect("lock poisoned");
        let before = posts.len();
        posts.retain(|p| p.id != *id);
        Ok(posts.len() != before)
    }
}

impl std::fmt::Debug for InMemoryPostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPostStore")
            .field("post_count", &self.len())
            .finish()
    }
}
