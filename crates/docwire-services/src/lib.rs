//! Docwire Services Library
//!
//! This crate provides the service components of the delivery pipeline:
//! - WhatsApp gateway client (Exotel) with defensive response parsing
//! - Phone number normalization
//! - Ephemeral download grant registry with periodic expiry sweep
//! - Post-delivery cleanup scheduler (archive, then purge)

pub mod cleanup;
pub mod gateway;
pub mod grants;
pub mod phone;

// Re-export commonly used types
pub use cleanup::CleanupScheduler;
pub use gateway::{DeliveryError, ExotelGateway, ExotelGatewayConfig, WhatsAppGateway};
pub use grants::{Clock, GrantRegistry, SystemClock};
