use thiserror::Error;

use crate::id::PostId;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid post id: {0}")]
    InvalidPostId(String),

    #[error("Title and content are required fields")]
    MissingRequiredFields,

    #[error("post id is immutable: {0}")]
    ImmutableId(PostId),
}
