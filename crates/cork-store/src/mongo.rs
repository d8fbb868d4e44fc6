//! MongoDB-backed post store (feature `mongo`).
//!
//! Posts live in the `posts` collection of the database named in the
//! connection string (`corkboard` if none is given). Ids are stored as the
//! hyphenated UUID string in `_id`, which sorts in creation order.
//! Like, dislike and comment map onto `$inc` / `$push` inside a single
//! `findOneAndUpdate`, so concurrent mutations rely on MongoDB's
//! single-document atomicity.

use async_trait::async_trait;
use cork_types::{Comment, NewPost, Post, PostId, PostMutation, PostPatch};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::PostStore;

const DEFAULT_DATABASE: &str = "corkboard";
const COLLECTION: &str = "posts";

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    dislikes: i64,
    #[serde(default)]
    comments: Vec<Comment>,
}

impl PostDocument {
    fn from_post(post: &Post) -> StoreResult<Self> {
        Ok(Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            content: post.content.clone(),
            file: post.file.clone(),
            likes: to_i64(post.likes)?,
            dislikes: to_i64(post.dislikes)?,
            comments: post.comments.clone(),
        })
    }

    fn into_post(self) -> StoreResult<Post> {
        let id = PostId::parse(&self.id)
            .map_err(|e| StoreError::Serialization(format!("document {}: {e}", self.id)))?;
        Ok(Post {
            id,
            title: self.title,
            content: self.content,
            file: self.file,
            likes: self.likes.max(0) as u64,
            dislikes: self.dislikes.max(0) as u64,
            comments: self.comments,
        })
    }
}

fn to_i64(n: u64) -> StoreResult<i64> {
    i64::try_from(n).map_err(|_| StoreError::Serialization(format!("counter out of range: {n}")))
}

fn to_bson<T: Serialize>(value: &T) -> StoreResult<Bson> {
    bson::to_bson(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn by_id(id: &PostId) -> Document {
    doc! { "_id": id.to_string() }
}

fn return_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

/// A [`PostStore`] backed by a MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoPostStore {
    client: Client,
    posts: Collection<PostDocument>,
}

impl MongoPostStore {
    /// Connect using a `mongodb://` or `mongodb+srv://` connection string.
    pub async fn connect(uri: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));
        debug!(database = %db.name(), "connected to mongodb");
        let posts = db.collection::<PostDocument>(COLLECTION);
        Ok(Self { client, posts })
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Post>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let docs: Vec<PostDocument> = self.posts.find(None, options).await?.try_collect().await?;
        docs.into_iter().map(PostDocument::into_post).collect()
    }

    async fn get(&self, id: &PostId) -> StoreResult<Option<Post>> {
        self.posts
            .find_one(by_id(id), None)
            .await?
            .map(PostDocument::into_post)
            .transpose()
    }

    async fn insert(&self, new: NewPost) -> StoreResult<Post> {
        let post = Post::create(PostId::new(), new);
        self.posts
            .insert_one(PostDocument::from_post(&post)?, None)
            .await?;
        Ok(post)
    }

    async fn apply(&self, id: &PostId, mutation: PostMutation) -> StoreResult<Option<Post>> {
        let update = match mutation {
            PostMutation::Like => doc! { "$inc": { "likes": 1_i64 } },
            PostMutation::Dislike => doc! { "$inc": { "dislikes": 1_i64 } },
            PostMutation::Comment(comment) => doc! { "$push": { "comments": to_bson(&comment)? } },
        };
        self.posts
            .find_one_and_update(by_id(id), update, return_after())
            .await?
            .map(PostDocument::into_post)
            .transpose()
    }

    async fn update(&self, id: &PostId, patch: PostPatch) -> StoreResult<Option<Post>> {
        patch.check_id(id)?;
        let mut set = Document::new();
        if let Some(title) = patch.title {
            set.insert("title", title);
        }
        if let Some(content) = patch.content {
            set.insert("content", content);
        }
        if let Some(file) = patch.file {
            set.insert("file", file);
        }
        if let Some(likes) = patch.likes {
            set.insert("likes", to_i64(likes)?);
        }
        if let Some(dislikes) = patch.dislikes {
            set.insert("dislikes", to_i64(dislikes)?);
        }
        if let Some(comments) = patch.comments {
            set.insert("comments", to_bson(&comments)?);
        }
        if set.is_empty() {
            return self.get(id).await;
        }
        self.posts
            .find_one_and_update(by_id(id), doc! { "$set": set }, return_after())
            .await?
            .map(PostDocument::into_post)
            .transpose()
    }

    async fn delete(&self, id: &PostId) -> StoreResult<bool> {
        let result = self.posts.delete_one(by_id(id), None).await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_roundtrip() {
        let new = NewPost::new(Some("t".into()), Some("c".into())).unwrap();
        let mut post = Post::create(PostId::new(), new);
        post.apply(PostMutation::Like);
        post.apply(PostMutation::Comment(Comment::new("hi")));
        let doc = PostDocument::from_post(&post).unwrap();
        assert_eq!(doc.id, post.id.to_string());
        assert_eq!(doc.into_post().unwrap(), post);
    }

    #[test]
    fn negative_counters_clamp_to_zero() {
        let doc = PostDocument {
            id: PostId::new().to_string(),
            title: "t".into(),
            content: "c".into(),
            file: None,
            likes: -3,
            dislikes: 2,
            comments: Vec::new(),
        };
        let post = doc.into_post().unwrap();
        assert_eq!(post.likes, 0);
        assert_eq!(post.dislikes, 2);
    }

    #[test]
    fn foreign_id_documents_are_rejected() {
        let doc = PostDocument {
            id: "64b7f0c2e4b0a1a2b3c4d5e6".into(),
            title: "t".into(),
            content: "c".into(),
            file: None,
            likes: 0,
            dislikes: 0,
            comments: Vec::new(),
        };
        assert!(matches!(doc.into_post(), Err(StoreError::Serialization(_))));
    }
}
