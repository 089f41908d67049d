//! Post-delivery cleanup scheduler.
//!
//! After a successful dispatch the stored document is first archived (a
//! cheap rename on the filesystem backend, a no-op on object storage), then
//! purged once the access window plus a safety buffer has elapsed. Both steps
//! are best-effort: failures are logged and never retried or surfaced to the
//! request that scheduled them.

use docwire_storage::Storage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Schedules archive-then-purge reclamation of delivered documents.
///
/// Timers are process-local; pending cleanups do not survive a restart.
/// Scheduled work is observable through [`pending`](Self::pending), and
/// [`cancel`](Self::cancel) exists on the interface as an explicit no-op:
/// once scheduled, a cleanup runs to completion.
#[derive(Clone)]
pub struct CleanupScheduler {
    storage: Arc<dyn Storage>,
    archive_delay: Duration,
    purge_delay: Duration,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl CleanupScheduler {
    /// # Arguments
    /// * `archive_delay` - delay before the archive step (short, near-immediate)
    /// * `purge_delay` - additional delay after archiving before the permanent
    ///   delete; sized as grant TTL plus a safety buffer so a still-valid
    ///   download link never dangles
    pub fn new(storage: Arc<dyn Storage>, archive_delay: Duration, purge_delay: Duration) -> Self {
        CleanupScheduler {
            storage,
            archive_delay,
            purge_delay,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Schedule reclamation of a stored document. Fire-and-forget: returns
    /// immediately, never blocks the request path.
    pub fn schedule(&self, storage_key: String) {
        let storage = self.storage.clone();
        let pending = self.pending.clone();
        let archive_delay = self.archive_delay;
        let purge_delay = self.purge_delay;

        tracing::info!(
            key = %storage_key,
            archive_delay_ms = archive_delay.as_millis() as u64,
            purge_delay_secs = purge_delay.as_secs(),
            "Cleanup scheduled"
        );

        tokio::spawn(async move {
            {
                pending.lock().await.insert(storage_key.clone());
            }

            tokio::time::sleep(archive_delay).await;

            if let Err(e) = storage.archive(&storage_key).await {
                // The operator may have removed the file already; purge below
                // still runs and copes with whatever state remains.
                tracing::error!(error = %e, key = %storage_key, "Archive step failed");
            }

            tokio::time::sleep(purge_delay).await;

            if let Err(e) = storage.purge(&storage_key).await {
                tracing::error!(error = %e, key = %storage_key, "Purge step failed");
            }

            pending.lock().await.remove(&storage_key);
        });
    }

    /// Snapshot of storage keys with reclamation still in flight.
    pub async fn pending(&self) -> Vec<String> {
        let pending = self.pending.lock().await;
        let mut keys: Vec<String> = pending.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Cancellation is not supported: scheduled cleanups always run. The
    /// method exists so callers bind to a stable interface if cancellation
    /// is ever added.
    pub fn cancel(&self, storage_key: &str) {
        tracing::debug!(key = %storage_key, "Cleanup cancellation requested (no-op)");
    }
}
