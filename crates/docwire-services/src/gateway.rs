//! WhatsApp gateway client.
//!
//! The gateway is modeled as a capability trait so the pipeline and its tests
//! never depend on the concrete provider. The production implementation talks
//! to Exotel's WhatsApp Business API. Exotel's response shapes are not stable
//! across account configurations, so both the message identifier and error
//! detail are parsed through ordered fallback chains.

use anyhow::Context;
use async_trait::async_trait;
use docwire_core::models::delivery::{DeliveryResult, UNKNOWN_MESSAGE_ID};
use docwire_core::validation::sanitize_filename;
use docwire_core::Config;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::phone;

const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivery operation errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("Invalid document URL: {0}")]
    InvalidDocumentUrl(String),

    #[error("Gateway rejected message: {0}")]
    Gateway(String),

    #[error("Gateway unreachable: {0}")]
    Transport(String),

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),
}

/// WhatsApp delivery capability.
#[async_trait]
pub trait WhatsAppGateway: Send + Sync {
    /// Send a document message to `phone_raw`, linking `document_url` with
    /// `display_name` as the suggested filename.
    async fn send_document(
        &self,
        phone_raw: &str,
        document_url: &str,
        display_name: &str,
    ) -> Result<DeliveryResult, DeliveryError>;
}

/// Configuration for the Exotel gateway client
#[derive(Clone)]
pub struct ExotelGatewayConfig {
    pub api_key: String,
    pub api_token: String,
    pub sid: String,
    pub template_name: String,
    pub from_number: String,
    pub endpoint_base: String,
    pub timeout: Duration,
}

impl ExotelGatewayConfig {
    /// Build from application config; `None` when the credential set is
    /// incomplete (storage-only deployments).
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(ExotelGatewayConfig {
            api_key: config.exotel_api_key()?.to_string(),
            api_token: config.exotel_api_token()?.to_string(),
            sid: config.exotel_sid()?.to_string(),
            template_name: config.exotel_template_name().to_string(),
            from_number: config.exotel_from_number()?.to_string(),
            endpoint_base: config.exotel_endpoint_base().to_string(),
            timeout: config.gateway_timeout(),
        })
    }
}

/// Exotel WhatsApp Business API client
pub struct ExotelGateway {
    http_client: reqwest::Client,
    config: ExotelGatewayConfig,
}

impl ExotelGateway {
    pub fn new(config: ExotelGatewayConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client for Exotel gateway")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn messages_endpoint(&self) -> String {
        format!(
            "{}/v2/accounts/{}/messages",
            self.config.endpoint_base.trim_end_matches('/'),
            self.config.sid
        )
    }

    /// Template message with a document header component, per Exotel's
    /// WhatsApp Business API format.
    fn build_payload(&self, to: &str, document_url: &str, filename: &str) -> Value {
        json!({
            "custom_data": format!("Document - {}", filename),
            "whatsapp": {
                "messages": [
                    {
                        "from": self.config.from_number,
                        "to": to,
                        "content": {
                            "type": "template",
                            "template": {
                                "name": self.config.template_name,
                                "language": {
                                    "policy": "deterministic",
                                    "code": "en"
                                },
                                "components": [
                                    {
                                        "type": "header",
                                        "parameters": [
                                            {
                                                "type": "document",
                                                "document": {
                                                    "link": document_url,
                                                    "filename": filename
                                                }
                                            }
                                        ]
                                    }
                                ]
                            }
                        }
                    }
                ]
            }
        })
    }

    /// Lightweight reachability probe of the document URL. The gateway does
    /// its own fetch, so a failed probe only logs a warning.
    async fn preflight(&self, document_url: &str) {
        let result = self
            .http_client
            .head(document_url)
            .timeout(PREFLIGHT_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %document_url, status = %response.status(), "Document URL is reachable");
            }
            Ok(response) => {
                tracing::warn!(
                    url = %document_url,
                    status = %response.status(),
                    "Document URL probe returned non-success; continuing anyway"
                );
            }
            Err(e) => {
                tracing::warn!(
                    url = %document_url,
                    error = %e,
                    "Document URL might not be accessible; continuing anyway"
                );
            }
        }
    }
}

#[async_trait]
impl WhatsAppGateway for ExotelGateway {
    async fn send_document(
        &self,
        phone_raw: &str,
        document_url: &str,
        display_name: &str,
    ) -> Result<DeliveryResult, DeliveryError> {
        // Normalization failures abort before any network I/O
        let to = phone::normalize(phone_raw)?;

        let filename = sanitize_filename(display_name);

        if !document_url.starts_with("http://") && !document_url.starts_with("https://") {
            return Err(DeliveryError::InvalidDocumentUrl(format!(
                "Not an absolute http(s) URL: {}",
                document_url
            )));
        }

        self.preflight(document_url).await;

        let endpoint = self.messages_endpoint();
        let payload = self.build_payload(&to, document_url, &filename);

        tracing::info!(to = %to, filename = %filename, "Sending WhatsApp document message via Exotel");

        let response = self
            .http_client
            .post(&endpoint)
            .basic_auth(&self.config.api_key, Some(&self.config.api_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();
        let body: Value = serde_json::from_str(&body_text).unwrap_or(Value::Null);

        if !status.is_success() {
            let detail = extract_error_message(&body)
                .unwrap_or_else(|| if body_text.is_empty() { status.to_string() } else { body_text });
            tracing::error!(status = %status, error = %detail, "Exotel API rejected message");
            return Err(DeliveryError::Gateway(detail));
        }

        let message_id = extract_message_id(&body);

        tracing::info!(
            to = %to,
            message_id = %message_id,
            "WhatsApp message accepted by gateway"
        );

        Ok(DeliveryResult {
            message_id,
            raw: body,
        })
    }
}

/// Extract a provider message identifier from a (variably shaped) response
/// body. Tries each known field path in order and falls back to the sentinel.
pub fn extract_message_id(body: &Value) -> String {
    const PATHS: [&str; 3] = [
        "/data/messages/0/id",
        "/messages/0/id",
        "/messageId",
    ];

    PATHS
        .iter()
        .find_map(|path| body.pointer(path).and_then(Value::as_str))
        .unwrap_or(UNKNOWN_MESSAGE_ID)
        .to_string()
}

/// Extract the most specific error text available from a gateway error body.
pub fn extract_error_message(body: &Value) -> Option<String> {
    const PATHS: [&str; 5] = [
        "/message",
        "/error",
        "/error_description",
        "/errors/0/message",
        "/errors/0/detail",
    ];

    PATHS
        .iter()
        .find_map(|path| body.pointer(path).and_then(Value::as_str))
        .map(String::from)
        .or_else(|| {
            if body.is_null() {
                None
            } else {
                Some(body.to_string())
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gateway() -> ExotelGateway {
        ExotelGateway::new(ExotelGatewayConfig {
            api_key: "key".to_string(),
            api_token: "token".to_string(),
            sid: "sid123".to_string(),
            template_name: "document_delivery".to_string(),
            from_number: "911234567890".to_string(),
            endpoint_base: "https://api.exotel.com".to_string(),
            timeout: Duration::from_secs(30),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn invalid_phone_aborts_before_network() {
        let gateway = test_gateway();
        let result = gateway
            .send_document("12345", "https://example.com/a.pdf", "a.pdf")
            .await;
        assert!(matches!(result, Err(DeliveryError::InvalidPhoneNumber(_))));
    }

    #[tokio::test]
    async fn relative_url_is_rejected() {
        let gateway = test_gateway();
        let result = gateway
            .send_document("9876543210", "uploads/a.pdf", "a.pdf")
            .await;
        assert!(matches!(result, Err(DeliveryError::InvalidDocumentUrl(_))));
    }

    #[test]
    fn endpoint_includes_account_sid() {
        let gateway = test_gateway();
        assert_eq!(
            gateway.messages_endpoint(),
            "https://api.exotel.com/v2/accounts/sid123/messages"
        );
    }

    #[test]
    fn payload_embeds_document_header() {
        let gateway = test_gateway();
        let payload = gateway.build_payload(
            "919876543210",
            "https://example.com/d/abc",
            "receipt.pdf",
        );

        assert_eq!(payload["whatsapp"]["messages"][0]["to"], "919876543210");
        assert_eq!(
            payload["whatsapp"]["messages"][0]["from"],
            "911234567890"
        );
        let template = &payload["whatsapp"]["messages"][0]["content"]["template"];
        assert_eq!(template["name"], "document_delivery");
        assert_eq!(template["language"]["policy"], "deterministic");
        let document = &template["components"][0]["parameters"][0]["document"];
        assert_eq!(document["link"], "https://example.com/d/abc");
        assert_eq!(document["filename"], "receipt.pdf");
    }

    #[test]
    fn message_id_fallback_chain() {
        let nested = json!({"data": {"messages": [{"id": "msg-nested"}]}});
        assert_eq!(extract_message_id(&nested), "msg-nested");

        let flat = json!({"messages": [{"id": "msg-flat"}]});
        assert_eq!(extract_message_id(&flat), "msg-flat");

        let top = json!({"messageId": "msg-top"});
        assert_eq!(extract_message_id(&top), "msg-top");

        // First matching path wins
        let both = json!({
            "data": {"messages": [{"id": "msg-nested"}]},
            "messageId": "msg-top"
        });
        assert_eq!(extract_message_id(&both), "msg-nested");

        let none = json!({"status": "queued"});
        assert_eq!(extract_message_id(&none), UNKNOWN_MESSAGE_ID);

        assert_eq!(extract_message_id(&Value::Null), UNKNOWN_MESSAGE_ID);
    }

    #[test]
    fn error_message_extraction_order() {
        let message = json!({"message": "template not found"});
        assert_eq!(
            extract_error_message(&message).unwrap(),
            "template not found"
        );

        let nested = json!({"errors": [{"detail": "number not on whatsapp"}]});
        assert_eq!(
            extract_error_message(&nested).unwrap(),
            "number not on whatsapp"
        );

        let unknown_shape = json!({"weird": true});
        assert_eq!(
            extract_error_message(&unknown_shape).unwrap(),
            "{\"weird\":true}"
        );

        assert!(extract_error_message(&Value::Null).is_none());
    }
}
