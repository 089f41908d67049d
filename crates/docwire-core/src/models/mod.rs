pub mod delivery;
pub mod document;

pub use delivery::{DeliveryReceipt, DeliveryResult};
pub use document::StoredDocument;
