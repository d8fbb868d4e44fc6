//! Directory-backed document store.
//!
//! [`FilePostStore`] keeps one pretty-printed JSON document per post,
//! named `<id>.json`, under a root directory. Writes go to a temporary file
//! that is then renamed over the target, so a crash never leaves a
//! half-written document behind.
//!
//! Read-modify-write operations are serialized by a store-wide async mutex;
//! reads do not take it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cork_types::{NewPost, Post, PostId, PostMutation, PostPatch};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::PostStore;

const EXTENSION: &str = "json";

/// A [`PostStore`] persisting posts as JSON files in a directory.
#[derive(Debug)]
pub struct FilePostStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePostStore {
    /// Open (or create) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened file post store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn document_path(&self, id: &PostId) -> PathBuf {
        self.root.join(format!("{id}.{EXTENSION}"))
    }

    async fn read_document(&self, path: &Path) -> StoreResult<Option<Post>> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| StoreError::CorruptDocument {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn write_document(&self, post: &Post) -> StoreResult<()> {
        let path = self.document_path(&post.id);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(post)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn modify(
        &self,
        id: &PostId,
        f: impl FnOnce(&mut Post) -> StoreResult<()> + Send,
    ) -> StoreResult<Option<Post>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut post) = self.read_document(&self.document_path(id)).await? else {
            return Ok(None);
        };
        f(&mut post)?;
        self.write_document(&post).await?;
        Ok(Some(post))
    }
}

#[async_trait]
impl PostStore for FilePostStore {
    async fn ping(&self) -> StoreResult<()> {
        let meta = fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Post>> {
        let mut posts = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // May have been deleted since read_dir.
            if let Some(post) = self.read_document(&path).await? {
                posts.push(post);
            }
        }
        posts.sort_by_key(|p| p.id);
        Ok(posts)
    }

    async fn get(&self, id: &PostId) -> StoreResult<Option<Post>> {
        self.read_document(&self.document_path(id)).await
    }

    async fn insert(&self, new: NewPost) -> StoreResult<Post> {
        let post = Post::create(PostId::new(), new);
        let _guard = self.write_lock.lock().await;
        self.write_document(&post).await?;
        debug!(id = %post.id, "inserted post");
        Ok(post)
    }

    async fn apply(&self, id: &PostId, mutation: PostMutation) -> StoreResult<Option<Post>> {
        self.modify(id, |post| {
            post.apply(mutation);
            Ok(())
        })
        .await
    }

    async fn update(&self, id: &PostId, patch: PostPatch) -> StoreResult<Option<Post>> {
        self.modify(id, |post| post.apply_patch(patch).map_err(StoreError::from))
            .await
    }

    async fn delete(&self, id: &PostId) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use cork_types::Comment;

    fn new_post(title: &str) -> NewPost {
        NewPost::new(Some(title.into()), Some("body".into())).unwrap()
    }

    #[tokio::test]
    async fn open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("posts");
        let store = FilePostStore::open(&root).await.unwrap();
        assert!(root.is_dir());
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn posts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = FilePostStore::open(dir.path()).await.unwrap();
            let post = store.insert(new_post("persisted")).await.unwrap();
            store.apply(&post.id, PostMutation::Like).await.unwrap();
            post.id
        };
        let store = FilePostStore::open(dir.path()).await.unwrap();
        let post = store.get(&id).await.unwrap().expect("should exist");
        assert_eq!(post.title, "persisted");
        assert_eq!(post.likes, 1);
    }

    #[tokio::test]
    async fn list_is_creation_ordered_and_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePostStore::open(dir.path()).await.unwrap();
        let a = store.insert(new_post("a")).await.unwrap();
        let b = store.insert(new_post("b")).await.unwrap();
        std::fs::write(dir.path().join("README.txt"), b"not a post").unwrap();
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePostStore::open(dir.path()).await.unwrap();
        let id = PostId::new();
        std::fs::write(dir.path().join(format!("{id}.json")), b"{ nope").unwrap();
        let err = store.get(&id).await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptDocument { .. }));
    }

    #[tokio::test]
    async fn comment_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePostStore::open(dir.path()).await.unwrap();
        let post = store.insert(new_post("a")).await.unwrap();
        let after = store
            .apply(&post.id, PostMutation::Comment(Comment::new("hi")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.comments, vec![Comment::new("hi")]);

        assert!(store.delete(&post.id).await.unwrap());
        assert!(!store.delete(&post.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_post_is_not_created_by_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePostStore::open(dir.path()).await.unwrap();
        assert!(store
            .apply(&PostId::new(), PostMutation::Dislike)
            .await
            .unwrap()
            .is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_likes_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FilePostStore::open(dir.path()).await.unwrap());
        let post = store.insert(new_post("a")).await.unwrap();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            let id = post.id;
            handles.push(tokio::spawn(async move {
                store.apply(&id, PostMutation::Like).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.get(&post.id).await.unwrap().unwrap().likes, 20);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePostStore::open(dir.path()).await.unwrap();
        let post = store.insert(new_post("a")).await.unwrap();
        let patch = PostPatch {
            content: Some("rewritten".into()),
            ..Default::default()
        };
        let updated = store.update(&post.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.content, "rewritten");
        assert_eq!(updated.title, "a");
    }
}
