//! Startup configuration validation.

use anyhow::Result;
use docwire_core::Config;

/// Validate configuration before any service is constructed.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if !config.gateway_configured() {
        tracing::warn!(
            "Exotel credentials incomplete; the service will accept uploads but cannot dispatch"
        );
    }

    Ok(())
}
