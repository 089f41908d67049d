//! Configuration module
//!
//! This module provides configuration for the API and services, including
//! server, storage, gateway, and cleanup settings. Everything is loaded from
//! environment variables with development-friendly defaults.

use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_FILE_SIZE_BYTES, PDF_CONTENT_TYPE};
use crate::storage_types::{AccessMode, StorageBackend};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRANT_TTL_MINUTES: u64 = 10;
const DEFAULT_CLEANUP_BUFFER_MINUTES: u64 = 5;
const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 5;
const DEFAULT_ARCHIVE_DELAY_MS: u64 = 1_000;
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Externally reachable base URL, used to build download grant URLs.
    pub base_url: String,

    // Storage settings
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub archive_path: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub access_mode: AccessMode,

    // File admission settings
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,

    // Exotel gateway credentials
    pub exotel_api_key: Option<String>,
    pub exotel_api_token: Option<String>,
    pub exotel_sid: Option<String>,
    pub exotel_template_name: String,
    pub exotel_from_number: Option<String>,
    /// API base, overridable so tests can point the gateway at a local server.
    pub exotel_endpoint_base: String,
    pub gateway_timeout: Duration,

    // Grant and cleanup settings
    pub grant_ttl: Duration,
    pub grant_sweep_interval: Duration,
    pub cleanup_enabled: bool,
    pub cleanup_archive_delay: Duration,
    pub cleanup_buffer: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Best-effort .env loading for local development
        dotenvy::dotenv().ok();

        let storage_backend = env_or("STORAGE_BACKEND", "local")
            .parse::<StorageBackend>()?;

        let access_mode = env_or("ACCESS_MODE", "direct").parse::<AccessMode>()?;

        let cors_origins = env_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_bytes = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES);

        let allowed_extensions = env_or("ALLOWED_EXTENSIONS", "pdf")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_content_types = env_or("ALLOWED_CONTENT_TYPES", PDF_CONTENT_TYPE)
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            server_port: env_parse("PORT", DEFAULT_PORT),
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("NODE_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            cors_origins,
            base_url: env_or("BASE_URL", "http://localhost:3000"),

            storage_backend,
            local_storage_path: env_or("LOCAL_STORAGE_PATH", "./uploads"),
            archive_path: env_or("ARCHIVE_PATH", "./archives"),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            access_mode,

            max_file_size_bytes,
            allowed_extensions,
            allowed_content_types,

            exotel_api_key: env::var("EXOTEL_API_KEY").ok(),
            exotel_api_token: env::var("EXOTEL_API_TOKEN").ok(),
            exotel_sid: env::var("EXOTEL_SID").ok(),
            exotel_template_name: env_or("EXOTEL_TEMPLATE_NAME", "document_delivery"),
            exotel_from_number: env::var("EXOTEL_FROM_NUMBER").ok(),
            exotel_endpoint_base: env_or("EXOTEL_ENDPOINT", "https://api.exotel.com"),
            gateway_timeout: Duration::from_secs(env_parse(
                "GATEWAY_TIMEOUT_SECS",
                DEFAULT_GATEWAY_TIMEOUT_SECS,
            )),

            grant_ttl: Duration::from_secs(
                env_parse("URL_EXPIRY_MINUTES", DEFAULT_GRANT_TTL_MINUTES) * 60,
            ),
            grant_sweep_interval: Duration::from_secs(
                env_parse("GRANT_SWEEP_INTERVAL_MINUTES", DEFAULT_SWEEP_INTERVAL_MINUTES) * 60,
            ),
            cleanup_enabled: env_or("CLEANUP_ENABLED", "true")
                .to_lowercase()
                .eq("true"),
            cleanup_archive_delay: Duration::from_millis(env_parse(
                "CLEANUP_ARCHIVE_DELAY_MS",
                DEFAULT_ARCHIVE_DELAY_MS,
            )),
            cleanup_buffer: Duration::from_secs(
                env_parse("CLEANUP_BUFFER_MINUTES", DEFAULT_CLEANUP_BUFFER_MINUTES) * 60,
            ),
        })
    }

    /// Fail fast on misconfiguration that would only surface mid-request.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
            }
            if self.s3_region.is_none() {
                anyhow::bail!("S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3");
            }
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_MB must be greater than zero");
        }
        if self.grant_ttl.is_zero() {
            anyhow::bail!("URL_EXPIRY_MINUTES must be greater than zero");
        }
        if !self.base_url.starts_with("http") {
            anyhow::bail!("BASE_URL must be an absolute http(s) URL");
        }
        Ok(())
    }

    /// Whether the gateway has a full credential set. Startup warns (rather
    /// than aborts) without one so storage-only deployments keep working.
    pub fn gateway_configured(&self) -> bool {
        self.exotel_api_key.is_some()
            && self.exotel_api_token.is_some()
            && self.exotel_sid.is_some()
            && self.exotel_from_number.is_some()
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    // Convenience getters

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn local_storage_path(&self) -> &str {
        &self.local_storage_path
    }

    pub fn archive_path(&self) -> &str {
        &self.archive_path
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    pub fn exotel_api_key(&self) -> Option<&str> {
        self.exotel_api_key.as_deref()
    }

    pub fn exotel_api_token(&self) -> Option<&str> {
        self.exotel_api_token.as_deref()
    }

    pub fn exotel_sid(&self) -> Option<&str> {
        self.exotel_sid.as_deref()
    }

    pub fn exotel_template_name(&self) -> &str {
        &self.exotel_template_name
    }

    pub fn exotel_from_number(&self) -> Option<&str> {
        self.exotel_from_number.as_deref()
    }

    pub fn exotel_endpoint_base(&self) -> &str {
        &self.exotel_endpoint_base
    }

    pub fn gateway_timeout(&self) -> Duration {
        self.gateway_timeout
    }

    pub fn grant_ttl(&self) -> Duration {
        self.grant_ttl
    }

    pub fn grant_sweep_interval(&self) -> Duration {
        self.grant_sweep_interval
    }

    pub fn cleanup_enabled(&self) -> bool {
        self.cleanup_enabled
    }

    pub fn cleanup_archive_delay(&self) -> Duration {
        self.cleanup_archive_delay
    }

    pub fn cleanup_buffer(&self) -> Duration {
        self.cleanup_buffer
    }

    /// Total delay before an archived file is purged: grant TTL plus a
    /// safety buffer, so a still-valid link never dangles.
    pub fn cleanup_purge_delay(&self) -> Duration {
        self.grant_ttl + self.cleanup_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_delay_is_ttl_plus_buffer() {
        let mut config = Config::from_env().unwrap();
        config.grant_ttl = Duration::from_secs(600);
        config.cleanup_buffer = Duration::from_secs(300);
        assert_eq!(config.cleanup_purge_delay(), Duration::from_secs(900));
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "Local".parse::<StorageBackend>().unwrap(),
            StorageBackend::Local
        );
        assert!("gcs".parse::<StorageBackend>().is_err());
    }
}
