use std::path::PathBuf;

use cork_types::TypeError;

/// Errors from document and blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be decoded.
    #[error("corrupt document {path}: {reason}")]
    CorruptDocument { path: PathBuf, reason: String },

    /// The update payload was not applicable to the stored document.
    #[error(transparent)]
    InvalidUpdate(#[from] TypeError),

    /// The connection string names a backend this build does not provide.
    #[error("unsupported store scheme: {0}")]
    UnsupportedScheme(String),

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// A blob name that would escape the blob directory.
    #[error("invalid blob name: {0}")]
    InvalidBlobName(String),

    /// The backend is unreachable or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(feature = "mongo")]
impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
