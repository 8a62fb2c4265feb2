//! Document blob storage
//!
//! Stored files are addressed by an opaque `/uploads/<file>` URL.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const URL_PREFIX: &str = "/uploads/";

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob write failed: {0}")]
    Write(String),

    #[error("Blob delete failed: {0}")]
    Delete(String),

    #[error("Not a blob url: {0}")]
    ForeignUrl(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return the URL to reference them by
    async fn put(&self, extension: &str, bytes: Bytes) -> Result<String, BlobError>;
    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}

fn new_file_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase())
}

fn file_name_of(url: &str) -> Result<&str, BlobError> {
    url.strip_prefix(URL_PREFIX)
        .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
        .ok_or_else(|| BlobError::ForeignUrl(url.to_string()))
}

/// Files under a local directory, served at `/uploads`
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub async fn new(root: PathBuf) -> Result<Self, BlobError> {
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| BlobError::Write(format!("{}: {e}", root.display())))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, extension: &str, bytes: Bytes) -> Result<String, BlobError> {
        let name = new_file_name(extension);
        tokio::fs::write(self.root.join(&name), &bytes)
            .await
            .map_err(|e| BlobError::Write(e.to_string()))?;
        tracing::debug!(file = %name, size = bytes.len(), "Stored upload");
        Ok(format!("{URL_PREFIX}{name}"))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let name = file_name_of(url)?;
        tokio::fs::remove_file(self.root.join(name))
            .await
            .map_err(|e| BlobError::Delete(e.to_string()))
    }
}

/// Blobs held in memory
#[derive(Default)]
pub struct MemoryBlobStore {
    files: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    pub async fn get(&self, url: &str) -> Option<Bytes> {
        self.files.read().await.get(url).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, extension: &str, bytes: Bytes) -> Result<String, BlobError> {
        let url = format!("{URL_PREFIX}{}", new_file_name(extension));
        self.files.write().await.insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        file_name_of(url)?;
        self.files.write().await.remove(url);
        Ok(())
    }
}
