//! Upload admission checks.
//!
//! Checks run in a fixed order and short-circuit on the first failure:
//! presence, content type, size ceiling, non-empty. The extension gate runs
//! separately at the multipart boundary; both gates must pass.

use crate::error::AppError;

/// Validate content type against the allowlist. MIME parameters are stripped
/// before comparison (no `application/pdf; charset=x` bypass).
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase();

    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(
            "Only PDF files are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Validate file size ceiling.
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum limit of {}MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Reject empty uploads.
pub fn validate_not_empty(file_size: usize) -> Result<(), AppError> {
    if file_size == 0 {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    Ok(())
}

/// Validate file extension against the allowlist; returns the extension.
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    if extension == filename.to_lowercase() || !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(
            "Only PDF files are allowed".to_string(),
        ));
    }

    Ok(extension)
}

/// Run the admission checks on an extracted upload, in contract order.
pub fn validate_upload(
    data_len: usize,
    content_type: &str,
    max_size: usize,
    allowed_types: &[String],
) -> Result<(), AppError> {
    validate_content_type(content_type, allowed_types)?;
    validate_file_size(data_len, max_size)?;
    validate_not_empty(data_len)?;
    Ok(())
}

/// Sanitize a filename to a storage- and provider-safe token: characters
/// outside `[A-Za-z0-9._-]` become `_`, and any path components are dropped.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return "file".to_string();
    }

    sanitized
}
