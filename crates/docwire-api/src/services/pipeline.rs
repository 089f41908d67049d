//! Delivery pipeline orchestrator.
//!
//! Sequences one upload through admission, storage, access-grant issuance (or
//! public-URL pass-through), gateway dispatch, and cleanup scheduling. Each
//! stage either completes cleanly or aborts the whole run; there is no
//! partial-success response.
//!
//! Partial-failure policy: validation failures abort with no side effects;
//! a storage failure aborts before any grant or dispatch; a dispatch failure
//! deliberately leaves the stored file (and any grant) in place so the
//! operator can retry delivery without a re-upload. Only a successful
//! dispatch schedules cleanup.

use chrono::Utc;
use docwire_core::models::{DeliveryReceipt, StoredDocument};
use docwire_core::validation::{sanitize_filename, validate_upload};
use docwire_core::{AccessMode, AppError};
use docwire_services::{phone, WhatsAppGateway as _};
use docwire_storage::Storage as _;
use std::sync::Arc;
use uuid::Uuid;

use crate::state::AppState;

/// An upload as extracted from the multipart boundary, before admission.
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub original_name: String,
    pub content_type: String,
}

/// Orchestrates one document delivery per call.
pub struct DeliveryPipeline {
    state: Arc<AppState>,
}

impl DeliveryPipeline {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Run the full pipeline for one upload. Returns the receipt sent back to
    /// the uploader, or the first error that aborted the run.
    pub async fn deliver(
        &self,
        phone_raw: &str,
        file: UploadedFile,
    ) -> Result<DeliveryReceipt, AppError> {
        let config = &self.state.config;

        // Admission: plausibility only; real normalization happens in the
        // dispatcher right before the send.
        if !phone::is_plausible_number(phone_raw) {
            tracing::warn!(phone = %phone_raw, "Invalid phone number attempted");
            return Err(AppError::InvalidInput(
                "Invalid WhatsApp number format. Please enter 10-15 digits.".to_string(),
            ));
        }

        validate_upload(
            file.data.len(),
            &file.content_type,
            config.max_file_size_bytes,
            &config.allowed_content_types,
        )?;

        tracing::info!(
            phone = %phone_raw,
            file = %file.original_name,
            size_bytes = file.data.len(),
            "Processing PDF upload"
        );

        let document = self.store(file).await?;

        let document_url = self.resolve_document_url(&document).await?;

        let result = match self
            .state
            .gateway
            .send_document(phone_raw, &document_url, &document.original_name)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                // The stored file stays put so the operator can retry the
                // send later without a fresh upload.
                tracing::error!(
                    error = %e,
                    key = %document.storage_key(),
                    "Dispatch failed; stored file retained for manual retry"
                );
                return Err(AppError::Delivery(e.to_string()));
            }
        };

        self.log_transaction(phone_raw, &document, &result.message_id);

        if config.cleanup_enabled {
            self.state.cleanup.schedule(document.storage_key.clone());
        }

        Ok(DeliveryReceipt::sent(
            result.message_id,
            phone_raw.to_string(),
            document.original_name,
        ))
    }

    /// Write the upload under a fresh unique name: `<uuid>_<sanitized original>`.
    async fn store(&self, file: UploadedFile) -> Result<StoredDocument, AppError> {
        let id = Uuid::new_v4();
        let stored_name = format!("{}_{}", id, sanitize_filename(&file.original_name));
        let size_bytes = file.data.len() as u64;

        let storage_key = self
            .state
            .storage
            .save(&stored_name, &file.content_type, file.data)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, stored_name = %stored_name, "Failed to store PDF");
                AppError::Storage(e.to_string())
            })?;

        tracing::info!(key = %storage_key, "PDF stored successfully");

        Ok(StoredDocument {
            id,
            original_name: file.original_name,
            stored_name,
            storage_key,
            size_bytes,
            uploaded_at: Utc::now(),
        })
    }

    /// Resolve the URL the gateway will fetch the document from.
    ///
    /// Backends that expose their own public URL are used as-is in
    /// direct-public mode; everything else goes through the grant registry
    /// and this service's download proxy. The grant id equals the stored
    /// file's id, so one identifier traces a document end to end.
    async fn resolve_document_url(&self, document: &StoredDocument) -> Result<String, AppError> {
        let config = &self.state.config;

        if config.access_mode == AccessMode::DirectPublic {
            let url = self
                .state
                .storage
                .public_url(document.storage_key(), config.grant_ttl)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;

            if let Some(url) = url {
                tracing::info!(key = %document.storage_key(), "Using backend public URL");
                return Ok(url);
            }
        }

        let url = self
            .state
            .grants
            .issue(document.id, document.storage_key.clone())
            .await;
        tracing::info!(
            grant_id = %document.id,
            ttl_secs = config.grant_ttl.as_secs(),
            "Ephemeral download grant issued"
        );
        Ok(url)
    }

    /// One log line per completed transaction; nothing else is persisted.
    fn log_transaction(&self, phone: &str, document: &StoredDocument, message_id: &str) {
        tracing::info!(
            timestamp = %Utc::now().to_rfc3339(),
            phone = %phone,
            original_file = %document.original_name,
            stored_file = %document.stored_name,
            status = "sent",
            message_id = %message_id,
            "Transaction"
        );
    }
}
