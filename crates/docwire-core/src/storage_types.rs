use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because it's used in configuration and in the API state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// How documents are exposed to the messaging gateway.
///
/// `DirectPublic` hands the gateway the backend's own public URL when the
/// backend has one (object storage), falling back to an ephemeral download
/// grant otherwise. `ProxiedStream` always issues a grant and streams bytes
/// through this service's `/download/{id}` endpoint, regardless of backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    DirectPublic,
    ProxiedStream,
}

impl FromStr for AccessMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" | "direct-public" => Ok(AccessMode::DirectPublic),
            "proxied" | "proxied-stream" => Ok(AccessMode::ProxiedStream),
            _ => Err(anyhow::anyhow!("Invalid access mode: {}", s)),
        }
    }
}

impl Display for AccessMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AccessMode::DirectPublic => write!(f, "direct"),
            AccessMode::ProxiedStream => write!(f, "proxied"),
        }
    }
}
