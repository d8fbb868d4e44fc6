use std::sync::Arc;

use cork_store::{BlobStore, PostStore};

/// Shared handles injected into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(posts: Arc<dyn PostStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { posts, blobs }
    }
}
