use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::file::FilePostStore;
use crate::memory::InMemoryPostStore;
use crate::traits::PostStore;

/// A parsed document-store connection string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreUrl {
    /// `memory://` — volatile, process-local.
    Memory,
    /// `file://<dir>` — one JSON document per post under `<dir>`.
    File(PathBuf),
    /// `mongodb://…` or `mongodb+srv://…`, passed to the driver verbatim.
    Mongo(String),
}

impl StoreUrl {
    pub fn parse(url: &str) -> StoreResult<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| StoreError::InvalidConnectionString("missing scheme".into()))?;
        match scheme {
            "memory" => Ok(Self::Memory),
            "file" if rest.is_empty() => Err(StoreError::InvalidConnectionString(
                "file:// requires a directory".into(),
            )),
            "file" => Ok(Self::File(PathBuf::from(rest))),
            "mongodb" | "mongodb+srv" => Ok(Self::Mongo(url.to_string())),
            other => Err(StoreError::UnsupportedScheme(other.to_string())),
        }
    }

    /// The scheme, safe to log (never includes credentials).
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
            Self::Mongo(_) => "mongodb",
        }
    }
}

/// Open the post store named by `url`.
///
/// Only opens the backend; call [`PostStore::ping`] to confirm readiness.
pub async fn connect(url: &str) -> StoreResult<Arc<dyn PostStore>> {
    let parsed = StoreUrl::parse(url)?;
    info!(scheme = parsed.scheme(), "opening document store");
    match parsed {
        StoreUrl::Memory => Ok(Arc::new(InMemoryPostStore::new())),
        StoreUrl::File(root) => Ok(Arc::new(FilePostStore::open(root).await?)),
        #[cfg(feature = "mongo")]
        StoreUrl::Mongo(uri) => Ok(Arc::new(crate::mongo::MongoPostStore::connect(&uri).await?)),
        #[cfg(not(feature = "mongo"))]
        StoreUrl::Mongo(_) => Err(StoreError::UnsupportedScheme(
            "mongodb (rebuild with the `mongo` feature)".into(),
        )),
    }
}
