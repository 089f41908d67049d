use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document the pipeline has written to the storage backend.
///
/// Owned by a single pipeline run from the storage write until the run either
/// hands the file to the cleanup scheduler (successful delivery) or abandons
/// it in place for a manual retry (dispatch failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: Uuid,
    /// Filename as uploaded by the client, before sanitization.
    pub original_name: String,
    /// Name under which the file was written: `<id>_<sanitized original>`.
    pub stored_name: String,
    /// Backend-specific locator returned by the storage write.
    pub storage_key: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}
