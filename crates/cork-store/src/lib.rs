//! Document and blob storage for Corkboard.
//!
//! # Document Stores
//!
//! All post backends implement the [`PostStore`] trait:
//!
//! - [`InMemoryPostStore`] -- `Vec`-based store for tests and `memory://`
//! - [`FilePostStore`] -- one JSON document per post, for `file://<dir>`
//! - `MongoPostStore` -- MongoDB collection, for `mongodb://` (feature `mongo`)
//!
//! [`connect`] picks a backend from a connection string.
//!
//! # Blob Store
//!
//! [`FsBlobStore`] implements [`BlobStore`] over a single upload directory.
//!
//! # Design Rules
//!
//! 1. Ids are generated by the store on insert and are never rewritten.
//! 2. Like, dislike and comment are one atomic store operation each.
//! 3. A blob is never overwritten once written.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod connect;
pub mod error;
pub mod file;
pub mod memory;
#[cfg(feature = "mongo")]
pub mod mongo;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use blob::{blob_name, FsBlobStore, Upload};
pub use connect::{connect, StoreUrl};
pub use error::{StoreError, StoreResult};
pub use file::FilePostStore;
pub use memory::InMemoryPostStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoPostStore;
pub use traits::{BlobStore, PostStore};
