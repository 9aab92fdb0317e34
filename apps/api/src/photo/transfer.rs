//! Asset transfer seam and the local file a user picked.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::photo::asset::AssetReference;

/// Receives upload progress as an integer percentage in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Asset transfer failed: {0}")]
    Failed(String),

    #[error("Asset not found: {0}")]
    NotFound(String),
}

/// Moves photo bytes to and from remote storage.
#[async_trait]
pub trait AssetTransfer: Send + Sync {
    /// Uploads a local reference (see [`AssetReference::from_bytes`]) and
    /// resolves to its remote reference. Implementations call `on_progress`
    /// with non-decreasing percentages.
    async fn upload(
        &self,
        local: AssetReference,
        on_progress: ProgressCallback,
    ) -> Result<AssetReference, TransferError>;

    /// Reads back the bytes of an already uploaded asset.
    async fn fetch(&self, asset: &AssetReference) -> Result<Bytes, TransferError>;
}

#[derive(Debug, Clone)]
enum FileSource {
    Memory(Bytes),
    Disk(PathBuf),
}

/// A file chosen for upload. Carries its declared metadata; the content is
/// only read when the upload starts.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    content_type: String,
    size: u64,
    source: FileSource,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// Describes a file on disk. The size comes from its metadata and, when
    /// `content_type` is `None`, the type is inferred from the extension.
    pub async fn from_path(
        path: impl AsRef<Path>,
        content_type: Option<&str>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        let content_type = match content_type {
            Some(ct) => ct.to_string(),
            None => mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            name,
            content_type,
            size: meta.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn read_all(&self) -> std::io::Result<Bytes> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Disk(path) => tokio::fs::read(path).await.map(Bytes::from),
        }
    }
}
