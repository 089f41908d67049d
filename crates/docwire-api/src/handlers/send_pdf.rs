use crate::error::{ErrorResponse, HttpAppError};
use crate::services::pipeline::{DeliveryPipeline, UploadedFile};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    Json,
};
use docwire_core::models::DeliveryReceipt;
use docwire_core::validation::validate_file_extension;
use docwire_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/upload/send-pdf",
    tag = "delivery",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: `phoneNumber` (string), `pdf` (binary PDF file)"),
    responses(
        (status = 200, description = "PDF stored and dispatched", body = DeliveryReceipt),
        (status = 400, description = "Invalid phone number or file", body = ErrorResponse),
        (status = 500, description = "Storage or dispatch failure", body = ErrorResponse)
    )
)]
pub async fn send_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DeliveryReceipt>, HttpAppError> {
    let (phone_number, file) =
        extract_upload(multipart, &state.config.allowed_extensions).await?;

    let pipeline = DeliveryPipeline::new(&state);
    let receipt = pipeline.deliver(&phone_number, file).await?;

    Ok(Json(receipt))
}

/// Extract the phone number and file from the multipart form. The extension
/// gate runs here, before the field body is read; the MIME/size checks run
/// later in the pipeline, and both gates must pass.
async fn extract_upload(
    mut multipart: Multipart,
    allowed_extensions: &[String],
) -> Result<(String, UploadedFile), AppError> {
    let mut phone_number: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "phoneNumber" => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read phoneNumber: {}", e))
                })?;
                phone_number = Some(value);
            }
            "pdf" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple pdf fields are not allowed; send exactly one field named 'pdf'"
                            .to_string(),
                    ));
                }

                let original_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "document.pdf".to_string());

                validate_file_extension(&original_name, allowed_extensions)?;

                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::InvalidInput(format!("Failed to read file data: {}", e))
                    })?
                    .to_vec();

                file = Some(UploadedFile {
                    data,
                    original_name,
                    content_type,
                });
            }
            _ => {}
        }
    }

    let phone_number = phone_number.ok_or_else(|| {
        AppError::InvalidInput(
            "Invalid WhatsApp number format. Please enter 10-15 digits.".to_string(),
        )
    })?;

    let file = file.ok_or_else(|| AppError::InvalidInput("No PDF file provided".to_string()))?;

    Ok((phone_number, file))
}
