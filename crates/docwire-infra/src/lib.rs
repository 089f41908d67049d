//! Docwire Infrastructure Library
//!
//! Shared infrastructure components:
//! - Telemetry initialization (tracing subscriber)
//! - Middleware (request ID)

pub mod middleware;
pub mod telemetry;

// Re-export commonly used types
pub use middleware::{get_request_id, request_id_middleware, RequestId};
pub use telemetry::init_telemetry;
