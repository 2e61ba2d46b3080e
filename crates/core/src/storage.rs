//! Request-scoped local media storage.
//!
//! Every generation request writes into its own directory
//! `<root>/<request_id>/`, so concurrent requests never overwrite each
//! other's `song_1.*` / `song_2.*` files.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::generation::OutputFormat;
use crate::media::{parse_request_id, validate_media_filename};
use crate::types::RequestId;

/// Default media root relative to the working directory.
pub const DEFAULT_MEDIA_DIR: &str = "./media";

/// A file resolved from a validated lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub path: PathBuf,
    pub format: OutputFormat,
}

/// Local filesystem store for downloaded songs.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds all files for one request.
    pub fn request_dir(&self, request_id: RequestId) -> PathBuf {
        self.root.join(request_id.to_string())
    }

    /// Write one file into the request's directory, creating it if needed.
    ///
    /// `filename` must follow the saved media naming convention.
    pub async fn save(
        &self,
        request_id: RequestId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, CoreError> {
        validate_media_filename(filename)?;

        let dir = self.request_dir(request_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            CoreError::Internal(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let path = dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to write {}: {e}", path.display())))?;

        tracing::info!(
            request_id = %request_id,
            path = %path.display(),
            bytes = bytes.len(),
            "Saved media file",
        );
        Ok(path)
    }

    /// Resolve a client lookup to an existing file.
    ///
    /// Both path segments are validated before the filesystem is touched.
    pub async fn resolve(&self, request_id: &str, filename: &str) -> Result<StoredMedia, CoreError> {
        let request_id = parse_request_id(request_id)?;
        let format = validate_media_filename(filename)?;

        let path = self.request_dir(request_id).join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(StoredMedia { path, format }),
            _ => Err(CoreError::NotFound {
                entity: "Audio file",
                key: format!("{request_id}/{filename}"),
            }),
        }
    }
}

impl Default for MediaStore {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_DIR)
    }
}
