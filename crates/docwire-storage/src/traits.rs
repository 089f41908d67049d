//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Archive failed: {0}")]
    ArchiveFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked byte stream returned by [`Storage::download_stream`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3) must implement this trait.
/// The delivery pipeline works against it without coupling to backend
/// implementation details; the backend is selected once at startup.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a document under the given stored name and return its storage key.
    async fn save(
        &self,
        stored_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Delete a file by its storage key. Deleting a missing file is not an
    /// error; cleanup paths call this after files may already be gone.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Externally fetchable URL for the file, if this backend can expose one.
    ///
    /// Object storage returns a time-limited URL honoring `expires_in`;
    /// filesystem backends return `Ok(None)` and callers must go through the
    /// grant registry instead.
    async fn public_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<Option<String>>;

    /// Move the file into the retention holding area prior to final deletion.
    ///
    /// Backends without an archive tier treat this as a no-op.
    async fn archive(&self, storage_key: &str) -> StorageResult<()>;

    /// Permanently remove the file from wherever it currently lives
    /// (archive tier first, then active storage).
    async fn purge(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists in active storage.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size in bytes of the stored file, if it exists.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Download a file as a stream of `Bytes` chunks, so large documents are
    /// proxied without loading them entirely into memory.
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
