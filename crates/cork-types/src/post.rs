use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::PostId;

/// A comment embedded in a [`Post`].
///
/// Comments are not independently addressable and carry no required fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// The post record.
///
/// `likes` and `dislikes` default to zero and `comments` to an empty list so
/// that documents written without them still decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// Generated name of the uploaded attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// Materialize a new post with zeroed counters and no comments.
    pub fn create(id: PostId, new: NewPost) -> Self {
        Self {
            id,
            title: new.title,
            content: new.content,
            file: new.file,
            likes: 0,
            dislikes: 0,
            comments: Vec::new(),
        }
    }

    /// Apply a targeted mutation in place.
    pub fn apply(&mut self, mutation: PostMutation) {
        match mutation {
            PostMutation::Like => self.likes = self.likes.saturating_add(1),
            PostMutation::Dislike => self.dislikes = self.dislikes.saturating_add(1),
            PostMutation::Comment(comment) => self.comments.push(comment),
        }
    }

    /// Replace every field present in `patch`.
    ///
    /// Fails if the patch names a different id; the id never changes.
    pub fn apply_patch(&mut self, patch: PostPatch) -> Result<(), TypeError> {
        patch.check_id(&self.id)?;
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(file) = patch.file {
            self.file = Some(file);
        }
        if let Some(likes) = patch.likes {
            self.likes = likes;
        }
        if let Some(dislikes) = patch.dislikes {
            self.dislikes = dislikes;
        }
        if let Some(comments) = patch.comments {
            self.comments = comments;
        }
        Ok(())
    }
}

/// Validated input for creating a post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub file: Option<String>,
}

impl NewPost {
    /// Build from raw form values. Absent and empty values are both rejected.
    pub fn new(title: Option<String>, content: Option<String>) -> Result<Self, TypeError> {
        match (non_empty(title), non_empty(content)) {
            (Some(title), Some(content)) => Ok(Self {
                title,
                content,
                file: None,
            }),
            _ => Err(TypeError::MissingRequiredFields),
        }
    }

    /// Attach the generated name of an uploaded blob.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Targeted single-document mutation issued by the like, dislike and comment
/// endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostMutation {
    Like,
    Dislike,
    Comment(Comment),
}

/// Replace-by-fields update payload.
///
/// Only the post's own fields are accepted; anything else is rejected at
/// deserialization. `id` may be echoed back but must match the target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl PostPatch {
    /// Returns `true` if the patch overwrites fields that the dedicated
    /// endpoints otherwise only grow: counters, comments or the attachment.
    pub fn touches_engagement(&self) -> bool {
        self.likes.is_some()
            || self.dislikes.is_some()
            || self.comments.is_some()
            || self.file.is_some()
    }

    /// Reject a patch that carries an id other than `target`.
    pub fn check_id(&self, target: &PostId) -> Result<(), TypeError> {
        match &self.id {
            Some(id) if id != target => Err(TypeError::ImmutableId(*target)),
            _ => Ok(()),
        }
    }
}
