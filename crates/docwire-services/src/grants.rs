//! Ephemeral download grant registry.
//!
//! A grant maps an opaque identifier to a storage key for a bounded window,
//! making an otherwise private file publicly fetchable at
//! `<base>/download/<id>`. Expiry is enforced at read time (check-and-evict);
//! a periodic sweep bounds memory growth from grants whose resolve is never
//! called. There is no separate revoke operation.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Time source, injectable so expiry is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct Grant {
    target_key: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Registry of live download grants.
///
/// Constructed once at startup and shared via `Arc`; mutated by issuance
/// during pipeline runs, lookups from inbound download requests, and the
/// periodic sweep. The table lock keeps each of those atomic: a lookup racing
/// the sweep sees the entry fully present or fully gone.
pub struct GrantRegistry {
    entries: RwLock<HashMap<Uuid, Grant>>,
    clock: Arc<dyn Clock>,
    ttl: ChronoDuration,
    base_url: String,
}

impl GrantRegistry {
    pub fn new(base_url: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        GrantRegistry {
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::minutes(10)),
            base_url: base_url.into(),
        }
    }

    /// Record a grant for `target_key` and return its download URL.
    ///
    /// At most one live grant exists per id: re-issuing replaces any earlier
    /// entry for the same id.
    pub async fn issue(&self, id: Uuid, target_key: String) -> String {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.ttl;

        let grant = Grant {
            target_key,
            issued_at,
            expires_at,
        };

        self.entries.write().await.insert(id, grant);

        let url = self.download_url(id);
        tracing::info!(grant_id = %id, expires_at = %expires_at, url = %url, "Download grant issued");
        url
    }

    /// Resolve a grant to its storage key if still valid.
    ///
    /// Expired entries are evicted on the spot, so a second resolve of the
    /// same expired id reports the same absence.
    pub async fn resolve(&self, id: Uuid) -> Option<String> {
        let mut entries = self.entries.write().await;

        match entries.get(&id) {
            Some(grant) if self.clock.now() <= grant.expires_at => {
                Some(grant.target_key.clone())
            }
            Some(grant) => {
                tracing::warn!(
                    grant_id = %id,
                    issued_at = %grant.issued_at,
                    expires_at = %grant.expires_at,
                    "Download grant expired"
                );
                entries.remove(&id);
                None
            }
            None => None,
        }
    }

    /// Evict every expired entry; returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, grant| now <= grant.expires_at);
        before - entries.len()
    }

    /// Number of live entries (expired-but-unswept included).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The externally fetchable URL for a grant id.
    pub fn download_url(&self, id: Uuid) -> String {
        format!("{}/download/{}", self.base_url.trim_end_matches('/'), id)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::from_secs(600))
    }

    /// Start the background sweep task that evicts expired grants on an
    /// interval. Returns a JoinHandle for graceful shutdown.
    pub fn start_sweeper(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = tokio::time::interval(interval);
            // First tick fires immediately; skip it so the initial sweep
            // happens one interval after startup.
            sweep_interval.tick().await;

            loop {
                sweep_interval.tick().await;

                let evicted = self.sweep().await;
                if evicted > 0 {
                    tracing::info!(evicted, "Swept expired download grants");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Clock that only moves when the test says so.
    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(ManualClock {
                now: Mutex::new(Utc::now()),
            })
        }

        fn advance(&self, duration: ChronoDuration) {
            let mut now = self.now.lock().unwrap();
            *now += duration;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn registry(clock: Arc<ManualClock>) -> GrantRegistry {
        GrantRegistry::new(
            "http://localhost:3000",
            Duration::from_secs(600),
            clock,
        )
    }

    #[tokio::test]
    async fn grant_is_valid_immediately_after_issue() {
        let clock = ManualClock::new();
        let registry = registry(clock);
        let id = Uuid::new_v4();

        let url = registry.issue(id, "documents/abc.pdf".to_string()).await;
        assert_eq!(url, format!("http://localhost:3000/download/{}", id));

        assert_eq!(
            registry.resolve(id).await.as_deref(),
            Some("documents/abc.pdf")
        );
    }

    #[tokio::test]
    async fn grant_expires_and_is_evicted_on_resolve() {
        let clock = ManualClock::new();
        let registry = registry(clock.clone());
        let id = Uuid::new_v4();

        registry.issue(id, "documents/abc.pdf".to_string()).await;

        // Still valid at exactly the TTL boundary
        clock.advance(ChronoDuration::minutes(10));
        assert!(registry.resolve(id).await.is_some());

        // One minute past the boundary: invalid, and the entry is gone
        clock.advance(ChronoDuration::minutes(1));
        assert!(registry.resolve(id).await.is_none());
        assert_eq!(registry.len().await, 0);

        // Double-resolve after expiry stays invalid
        assert!(registry.resolve(id).await.is_none());
    }

    #[tokio::test]
    async fn unknown_grant_resolves_to_none() {
        let clock = ManualClock::new();
        let registry = registry(clock);
        assert!(registry.resolve(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn reissue_replaces_previous_grant() {
        let clock = ManualClock::new();
        let registry = registry(clock);
        let id = Uuid::new_v4();

        registry.issue(id, "documents/first.pdf".to_string()).await;
        registry.issue(id, "documents/second.pdf".to_string()).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(
            registry.resolve(id).await.as_deref(),
            Some("documents/second.pdf")
        );
    }

    #[tokio::test]
    async fn sweep_evicts_only_expired_entries() {
        let clock = ManualClock::new();
        let registry = registry(clock.clone());

        let old = Uuid::new_v4();
        registry.issue(old, "documents/old.pdf".to_string()).await;

        clock.advance(ChronoDuration::minutes(11));

        let fresh = Uuid::new_v4();
        registry.issue(fresh, "documents/fresh.pdf".to_string()).await;

        assert_eq!(registry.sweep().await, 1);
        assert_eq!(registry.len().await, 1);
        assert!(registry.resolve(fresh).await.is_some());
        assert!(registry.resolve(old).await.is_none());
    }

    #[tokio::test]
    async fn sweep_on_empty_registry_is_noop() {
        let clock = ManualClock::new();
        let registry = registry(clock);
        assert_eq!(registry.sweep().await, 0);
        assert!(registry.is_empty().await);
    }
}
