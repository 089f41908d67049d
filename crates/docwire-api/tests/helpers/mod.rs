//! Shared test fixtures: mock gateway, counting storage wrapper, and an
//! application builder wired with a manual clock for deterministic expiry.
#![allow(dead_code)] // Each test binary uses a different subset of helpers

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use docwire_api::state::AppState;
use docwire_core::models::DeliveryResult;
use docwire_core::{AccessMode, Config, StorageBackend};
use docwire_services::{
    phone, CleanupScheduler, Clock, DeliveryError, GrantRegistry, WhatsAppGateway,
};
use docwire_storage::{ByteStream, LocalStorage, Storage, StorageResult};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

pub const MOCK_MESSAGE_ID: &str = "mock-message-id";

/// Clock that only moves when a test advances it.
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(ManualClock {
            now: StdMutex::new(Utc::now()),
        })
    }

    pub fn advance(&self, duration: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub to: String,
    pub document_url: String,
    pub display_name: String,
}

/// Gateway double honoring the dispatcher contract: it normalizes the phone
/// number before doing anything else, records the call, then succeeds or
/// fails as configured.
pub struct MockGateway {
    pub calls: Mutex<Vec<RecordedCall>>,
    fail_with: Mutex<Option<String>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(MockGateway {
            calls: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(MockGateway {
            calls: Mutex::new(Vec::new()),
            fail_with: Mutex::new(Some(message.to_string())),
        })
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl WhatsAppGateway for MockGateway {
    async fn send_document(
        &self,
        phone_raw: &str,
        document_url: &str,
        display_name: &str,
    ) -> Result<DeliveryResult, DeliveryError> {
        let to = phone::normalize(phone_raw)?;

        self.calls.lock().await.push(RecordedCall {
            to,
            document_url: document_url.to_string(),
            display_name: display_name.to_string(),
        });

        if let Some(message) = self.fail_with.lock().await.clone() {
            return Err(DeliveryError::Gateway(message));
        }

        Ok(DeliveryResult {
            message_id: MOCK_MESSAGE_ID.to_string(),
            raw: json!({ "data": { "messages": [{ "id": MOCK_MESSAGE_ID }] } }),
        })
    }
}

/// Storage wrapper that counts writes, so admission tests can assert the
/// backend saw zero invocations.
pub struct CountingStorage {
    inner: Arc<dyn Storage>,
    save_calls: AtomicUsize,
}

impl CountingStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Arc<Self> {
        Arc::new(CountingStorage {
            inner,
            save_calls: AtomicUsize::new(0),
        })
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn save(
        &self,
        stored_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.save(stored_name, content_type, data).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn public_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<Option<String>> {
        self.inner.public_url(storage_key, expires_in).await
    }

    async fn archive(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.archive(storage_key).await
    }

    async fn purge(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.purge(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        self.inner.content_length(storage_key).await
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        self.inner.download_stream(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub gateway: Arc<MockGateway>,
    pub storage: Arc<CountingStorage>,
    pub clock: Arc<ManualClock>,
    pub _temp_dir: TempDir,
}

pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        base_url: "http://localhost:3000".to_string(),
        storage_backend: StorageBackend::Local,
        local_storage_path: temp_dir
            .path()
            .join("uploads")
            .to_string_lossy()
            .into_owned(),
        archive_path: temp_dir
            .path()
            .join("archives")
            .to_string_lossy()
            .into_owned(),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        access_mode: AccessMode::DirectPublic,
        max_file_size_bytes: 5 * 1024 * 1024,
        allowed_extensions: vec!["pdf".to_string()],
        allowed_content_types: vec!["application/pdf".to_string()],
        exotel_api_key: None,
        exotel_api_token: None,
        exotel_sid: None,
        exotel_template_name: "document_delivery".to_string(),
        exotel_from_number: None,
        exotel_endpoint_base: "https://api.exotel.com".to_string(),
        gateway_timeout: Duration::from_secs(30),
        grant_ttl: Duration::from_secs(600),
        grant_sweep_interval: Duration::from_secs(300),
        cleanup_enabled: false,
        cleanup_archive_delay: Duration::from_millis(10),
        cleanup_buffer: Duration::from_millis(100),
    }
}

pub async fn setup_test_app(gateway: Arc<MockGateway>) -> TestApp {
    setup_test_app_with(gateway, |_| {}).await
}

pub async fn setup_test_app_with(
    gateway: Arc<MockGateway>,
    customize: impl FnOnce(&mut Config),
) -> TestApp {
    let temp_dir = TempDir::new().expect("tempdir");
    let mut config = test_config(&temp_dir);
    customize(&mut config);

    let local = LocalStorage::new(&config.local_storage_path, &config.archive_path)
        .await
        .expect("local storage");
    let storage = CountingStorage::new(Arc::new(local));

    let clock = ManualClock::new();
    let grants = Arc::new(GrantRegistry::new(
        config.base_url.clone(),
        config.grant_ttl,
        clock.clone(),
    ));

    let cleanup = CleanupScheduler::new(
        storage.clone(),
        config.cleanup_archive_delay,
        config.cleanup_purge_delay(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        storage: storage.clone(),
        gateway: gateway.clone(),
        grants,
        cleanup,
        is_production: false,
    });

    let router = docwire_api::setup::routes::setup_routes(&config, state.clone()).expect("router");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        state,
        gateway,
        storage,
        clock,
        _temp_dir: temp_dir,
    }
}

/// Poll until `check` passes or the deadline hits.
pub async fn wait_for<F, Fut>(check: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not reached within deadline");
}
