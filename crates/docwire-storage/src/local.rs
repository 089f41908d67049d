use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Files live under `base_path` while active; `archive` renames them into
/// `archive_path`, where they wait out the retention window until `purge`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    archive_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for active file storage (e.g., "./uploads")
    /// * `archive_path` - Retention holding area (e.g., "./archives")
    pub async fn new(
        base_path: impl Into<PathBuf>,
        archive_path: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let archive_path = archive_path.into();

        for dir in [&base_path, &archive_path] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(LocalStorage {
            base_path,
            archive_path,
        })
    }

    /// Convert storage key to a filesystem path under `root` with security
    /// validation: the key must not be able to escape the root directory.
    fn key_to_path(&self, root: &Path, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = root.join(storage_key);

        if let Ok(canonical) = path.canonicalize() {
            let root_canonical = root.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize storage root: {}", e))
            })?;
            if canonical.strip_prefix(&root_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn live_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(&self.base_path, storage_key)
    }

    fn archived_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(&self.archive_path, storage_key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(
        &self,
        stored_name: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let key = crate::document_key(stored_name);
        let path = self.live_path(&key)?;
        let size = data.len();

        Self::ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage save successful"
        );

        Ok(key)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.live_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), key = %storage_key, "Local storage delete successful");

        Ok(())
    }

    async fn public_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<Option<String>> {
        // The filesystem has no public face; callers must issue a download
        // grant and serve the file through the proxy endpoint.
        self.live_path(storage_key)?;
        Ok(None)
    }

    async fn archive(&self, storage_key: &str) -> StorageResult<()> {
        let from = self.live_path(storage_key)?;
        let to = self.archived_path(storage_key)?;

        if !fs::try_exists(&from).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        Self::ensure_parent_dir(&to).await?;

        fs::rename(&from, &to).await.map_err(|e| {
            StorageError::ArchiveFailed(format!(
                "Failed to archive {} to {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;

        tracing::info!(key = %storage_key, archive = %to.display(), "File archived");

        Ok(())
    }

    async fn purge(&self, storage_key: &str) -> StorageResult<()> {
        // The file is usually in the archive tier by purge time, but a failed
        // archive step leaves it live; check both locations.
        for path in [
            self.archived_path(storage_key)?,
            self.live_path(storage_key)?,
        ] {
            if fs::try_exists(&path).await.unwrap_or(false) {
                fs::remove_file(&path).await.map_err(|e| {
                    StorageError::DeleteFailed(format!(
                        "Failed to purge file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                tracing::info!(key = %storage_key, path = %path.display(), "File purged");
                return Ok(());
            }
        }

        tracing::debug!(key = %storage_key, "Nothing to purge");
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.live_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.live_path(storage_key)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(meta.len())
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let path = self.live_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let reader = tokio_util::io::ReaderStream::new(file);

        let stream = reader.map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
