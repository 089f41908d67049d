//! Application state.
//!
//! All capability objects are injected at construction time so tests can
//! substitute mock implementations of the gateway and storage traits; the
//! handlers and pipeline never construct their own collaborators.

use docwire_core::Config;
use docwire_services::{CleanupScheduler, GrantRegistry, WhatsAppGateway};
use docwire_storage::Storage;
use std::sync::Arc;

/// Main application state shared across handlers.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub gateway: Arc<dyn WhatsAppGateway>,
    pub grants: Arc<GrantRegistry>,
    pub cleanup: CleanupScheduler,
    pub is_production: bool,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
