//! Filesystem blob store for uploaded attachments.
//!
//! Blobs are named `{field}-{timestamp_ms}{.ext}` where `.ext` is the
//! extension of the client-supplied file name (omitted if it has none).
//! Files are created with `create_new`, so an existing blob is never
//! overwritten: on a name clash the timestamp is bumped until a free name
//! is found.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Upper bound on timestamp bumps before giving up on a free name.
const MAX_NAME_ATTEMPTS: i64 = 1000;

/// A buffered file upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    /// Form field the file was sent under.
    pub field: String,
    /// File name as supplied by the client, if any.
    pub original_name: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn new(field: impl Into<String>, original_name: Option<String>, data: Bytes) -> Self {
        Self {
            field: field.into(),
            original_name,
            data,
        }
    }

    /// The generated blob name for this upload at `timestamp_ms`.
    pub fn blob_name(&self, timestamp_ms: i64) -> String {
        blob_name(&self.field, self.original_name.as_deref(), timestamp_ms)
    }
}

/// Build `{field}-{timestamp_ms}{.ext}`.
///
/// Characters outside `[A-Za-z0-9_-]` in the field name are replaced with
/// `_`, and an extension that is not purely alphanumeric is dropped, so the
/// result is always a single safe path component.
pub fn blob_name(field: &str, original_name: Option<&str>, timestamp_ms: i64) -> String {
    let field: String = field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let ext = original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{field}-{timestamp_ms}{ext}")
}

/// Returns `true` if `name` is a single path component that stays inside
/// the blob directory.
fn is_valid_blob_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// A [`BlobStore`] writing into a single directory.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (or create) the blob directory.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> StoreResult<PathBuf> {
        if !is_valid_blob_name(name) {
            return Err(StoreError::InvalidBlobName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, upload: &Upload, timestamp_ms: i64) -> StoreResult<String> {
        for bump in 0..MAX_NAME_ATTEMPTS {
            let name = upload.blob_name(timestamp_ms + bump);
            let path = self.path_for(&name)?;
            let file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            write_or_discard(file, &path, &upload.data).await?;
            debug!(name = %name, bytes = upload.data.len(), "stored blob");
            return Ok(name);
        }
        Err(StoreError::Unavailable(format!(
            "no free blob name for field {:?} near {timestamp_ms}",
            upload.field
        )))
    }

}

/// Write `data` into a freshly created blob. On failure the partial file is
/// removed so its name is free again.
async fn write_or_discard(mut file: fs::File, path: &Path, data: &[u8]) -> StoreResult<()> {
    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;
    drop(file);
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial blob");
        }
        return Err(e.into());
    }
    Ok(())
}
