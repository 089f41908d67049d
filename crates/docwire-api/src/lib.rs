//! Docwire API Library
//!
//! This crate provides the HTTP API handlers, middleware, and application
//! setup for the document delivery pipeline.

// Module declarations
mod api_doc;
mod handlers;

// Public modules
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::pipeline::{DeliveryPipeline, UploadedFile};
pub use state::AppState;
