use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel used when no message identifier can be extracted from the
/// gateway's response.
pub const UNKNOWN_MESSAGE_ID: &str = "unknown";

/// Normalized outcome of a successful gateway dispatch.
///
/// Gateway failures are represented as errors, not as a `succeeded: false`
/// result; a `DeliveryResult` always means the provider accepted the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Provider message identifier, or [`UNKNOWN_MESSAGE_ID`] if the
    /// response carried none in any recognized field.
    pub message_id: String,
    /// Raw provider payload, retained for the transaction log only.
    pub raw: serde_json::Value,
}

impl DeliveryResult {
    pub fn has_message_id(&self) -> bool {
        self.message_id != UNKNOWN_MESSAGE_ID
    }
}

/// Success body returned to the uploader.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    pub phone_number: String,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn sent(message_id: String, phone_number: String, file_name: String) -> Self {
        DeliveryReceipt {
            success: true,
            message: "PDF sent successfully via WhatsApp".to_string(),
            message_id,
            phone_number,
            file_name,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_uses_camel_case_keys() {
        let receipt = DeliveryReceipt::sent(
            "msg-1".to_string(),
            "919876543210".to_string(),
            "receipt.pdf".to_string(),
        );
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["messageId"], "msg-1");
        assert_eq!(json["phoneNumber"], "919876543210");
        assert_eq!(json["fileName"], "receipt.pdf");
        assert!(json["timestamp"].is_string());
    }
}
