//! Service initialization: gateway client, grant registry, cleanup scheduler.

use crate::state::AppState;
use anyhow::Result;
use async_trait::async_trait;
use docwire_core::models::DeliveryResult;
use docwire_core::Config;
use docwire_services::{
    CleanupScheduler, DeliveryError, ExotelGateway, ExotelGatewayConfig, GrantRegistry,
    SystemClock, WhatsAppGateway,
};
use docwire_storage::Storage;
use std::sync::Arc;

/// Stand-in gateway used when the Exotel credential set is incomplete.
/// Keeps uploads/downloads working in storage-only deployments; every
/// dispatch attempt fails with a configuration error.
struct UnconfiguredGateway;

#[async_trait]
impl WhatsAppGateway for UnconfiguredGateway {
    async fn send_document(
        &self,
        _phone_raw: &str,
        _document_url: &str,
        _display_name: &str,
    ) -> Result<DeliveryResult, DeliveryError> {
        Err(DeliveryError::NotConfigured(
            "EXOTEL_API_KEY, EXOTEL_API_TOKEN, EXOTEL_SID and EXOTEL_FROM_NUMBER must be set"
                .to_string(),
        ))
    }
}

/// Initialize all services and assemble the application state.
pub fn initialize_services(config: &Config, storage: Arc<dyn Storage>) -> Result<Arc<AppState>> {
    let gateway: Arc<dyn WhatsAppGateway> = match ExotelGatewayConfig::from_config(config) {
        Some(gateway_config) => {
            tracing::info!("Exotel gateway client initialized");
            Arc::new(ExotelGateway::new(gateway_config)?)
        }
        None => {
            tracing::warn!(
                "Exotel credentials not fully configured; dispatch will fail until they are set"
            );
            Arc::new(UnconfiguredGateway)
        }
    };

    let grants = Arc::new(GrantRegistry::new(
        config.base_url(),
        config.grant_ttl,
        Arc::new(SystemClock),
    ));

    // Detached background task; it lives for the life of the process.
    let _sweeper = grants.clone().start_sweeper(config.grant_sweep_interval);
    tracing::info!(
        interval_secs = config.grant_sweep_interval.as_secs(),
        "Grant sweeper started"
    );

    let cleanup = CleanupScheduler::new(
        storage.clone(),
        config.cleanup_archive_delay,
        config.cleanup_purge_delay(),
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        storage,
        gateway,
        grants,
        cleanup,
        is_production: config.is_production(),
    }))
}
