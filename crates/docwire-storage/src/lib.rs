//! Docwire Storage Library
//!
//! This crate provides the storage abstraction and implementations for
//! docwire. It includes the Storage trait and implementations for local
//! filesystem and S3-compatible object storage.
//!
//! # Storage key format
//!
//! All backends use the same key layout: `documents/{stored_name}`. Keys must
//! not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use docwire_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};

/// Generate the storage key for a stored document name.
///
/// All backends use this format so that locators stay interchangeable when
/// the backend is swapped through configuration.
pub fn document_key(stored_name: &str) -> String {
    format!("documents/{}", stored_name)
}
