use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use docwire_core::AppError;
use docwire_storage::{Storage as _, StorageError};
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

const GRANT_GONE_MESSAGE: &str = "File not found or link has expired";

#[utoipa::path(
    get,
    path = "/download/{grant_id}",
    tag = "delivery",
    params(
        ("grant_id" = String, Path, description = "Ephemeral download grant ID")
    ),
    responses(
        (status = 200, description = "Document bytes", content_type = "application/pdf"),
        (status = 404, description = "Grant absent or expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(grant_id = %grant_id))]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(grant_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    // A malformed id is indistinguishable from an expired one to the caller
    let id = Uuid::parse_str(&grant_id)
        .map_err(|_| AppError::NotFound(GRANT_GONE_MESSAGE.to_string()))?;

    let storage_key = state
        .grants
        .resolve(id)
        .await
        .ok_or_else(|| AppError::NotFound(GRANT_GONE_MESSAGE.to_string()))?;

    tracing::debug!(key = %storage_key, "Proxying document from storage");

    let stream = state
        .storage
        .download_stream(&storage_key)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            other => AppError::Storage(other.to_string()),
        })?;

    // Wrap storage stream for axum Body
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let file_name = storage_key
        .rsplit('/')
        .next()
        .unwrap_or(storage_key.as_str())
        .to_string();
    let content_disposition = format!("inline; filename=\"{}\"", file_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    tracing::info!(key = %storage_key, "File served");

    Ok(response)
}
