use async_trait::async_trait;
use cork_types::{NewPost, Post, PostId, PostMutation, PostPatch};

use crate::blob::Upload;
use crate::error::StoreResult;

/// Document store holding [`Post`] records.
///
/// All implementations must satisfy these invariants:
/// - Ids are generated by the store on insert and never change.
/// - [`apply`](PostStore::apply) is a single atomic operation on one
///   document: concurrent likes on the same post are never lost.
/// - `list` returns posts in creation order.
/// - All backend errors are propagated, never silently ignored.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Every stored post, oldest first.
    async fn list(&self) -> StoreResult<Vec<Post>>;

    /// Read a post by id. Returns `Ok(None)` if it does not exist.
    async fn get(&self, id: &PostId) -> StoreResult<Option<Post>>;

    /// Insert a new post and return it with its generated id.
    async fn insert(&self, new: NewPost) -> StoreResult<Post>;

    /// Apply a targeted mutation and return the post after it.
    ///
    /// Returns `Ok(None)` if the post does not exist; nothing is created.
    async fn apply(&self, id: &PostId, mutation: PostMutation) -> StoreResult<Option<Post>>;

    /// Replace the fields present in `patch` and return the post after it.
    ///
    /// Returns `Ok(None)` if the post does not exist.
    async fn update(&self, id: &PostId, patch: PostPatch) -> StoreResult<Option<Post>>;

    /// Delete a post by id. Returns `true` if the post existed.
    async fn delete(&self, id: &PostId) -> StoreResult<bool>;
}

/// Storage for uploaded attachments, addressed by generated name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write the upload and return its generated name.
    ///
    /// The name is derived from the upload's field name, `timestamp_ms` and
    /// the original file extension. An existing blob is never overwritten.
    async fn put(&self, upload: &Upload, timestamp_ms: i64) -> StoreResult<String>;
}
