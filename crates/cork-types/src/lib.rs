//! Foundation types for Corkboard.
//!
//! This crate provides the data model shared by every other Corkboard crate:
//! the post record, its embedded comments, and the payloads that create or
//! mutate it.
//!
//! # Key Types
//!
//! - [`PostId`] — UUID v7 post identifier, assigned by the store at creation
//! - [`Post`] — a title/content record with engagement counters and comments
//! - [`Comment`] — a text fragment embedded within a post
//! - [`NewPost`] — validated input for creating a post
//! - [`PostPatch`] — typed replace-by-fields update payload
//! - [`PostMutation`] — targeted like/dislike/comment mutation

pub mod error;
pub mod id;
pub mod post;

pub use error::TypeError;
pub use id::PostId;
pub use post::{Comment, NewPost, Post, PostMutation, PostPatch};
