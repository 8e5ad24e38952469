//! File handlers for the Web API.

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Path, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use validator::Validate;

use crate::web::dto::{
    DeleteResponse, FileInfo, FileInfoResponse, FileUploadResponse, UploadForm,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Cache policy for downloaded files.
const DOWNLOAD_CACHE_CONTROL: &str = "public, max-age=3600";

/// Generate a safe Content-Disposition header value for file downloads.
///
/// This function sanitizes the filename to prevent header injection attacks
/// and uses RFC 5987 encoding for non-ASCII filenames.
///
/// # Security
///
/// The function:
/// - Removes control characters (including CR, LF which could cause header injection)
/// - Replaces double quotes, backslashes and non-ASCII characters in the fallback name
/// - Uses RFC 5987 filename* parameter for proper Unicode support
pub fn content_disposition_header(filename: &str) -> String {
    // ASCII fallback for the plain filename parameter
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// POST /api/upload - Upload a file with an email and a label.
///
/// Multipart fields: `email`, `label`, and `file` (with a filename).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponse>, ApiError> {
    let mut form = UploadForm::default();
    let mut content: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "email" => form.email = field.text().await?.trim().to_string(),
            "label" => form.label = field.text().await?,
            "file" => {
                form.filename = field.file_name().unwrap_or("").to_string();
                content = Some(field.bytes().await?);
            }
            _ => {}
        }
    }

    if let Err(errors) = form.validate() {
        tracing::warn!(email = %form.email, "Upload rejected: invalid form");
        return Err(ApiError::from_validation_errors(errors));
    }

    let content = content.ok_or_else(|| ApiError::invalid("No file provided"))?;

    if content.len() as u64 > state.max_upload_size() {
        let max_mb = state.max_upload_size() / 1024 / 1024;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let request = form.into_request();
    let record = state
        .service
        .upload(&request, &mut &content[..])
        .await?;

    Ok(Json(FileUploadResponse::from_record(record)))
}

/// GET /download/:public_id - Download a file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let mut download = state.service.download(&public_id).await?;

    let mut content = Vec::with_capacity(download.file_size as usize);
    download
        .reader
        .read_to_end(&mut content)
        .await
        .map_err(|e| {
            tracing::error!(public_id = %public_id, error = %e, "Failed to read stored file");
            ApiError::internal("Failed to read file")
        })?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, download.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.original_filename),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .header(header::CACHE_CONTROL, DOWNLOAD_CACHE_CONTROL)
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// GET /api/file-info/:public_id - Get file metadata.
pub async fn get_file_info(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<FileInfoResponse>, ApiError> {
    let (record, file_exists_on_disk) = state.service.info_with_presence(&public_id).await?;

    if !file_exists_on_disk {
        tracing::warn!(public_id = %public_id, "File info: stored file missing");
    }

    Ok(Json(FileInfoResponse {
        file: FileInfo::from(record),
        file_exists_on_disk,
    }))
}

/// DELETE /api/file/:public_id - Delete a file and its record.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let record = state.service.delete(&public_id).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("File '{}' deleted successfully", record.original_filename),
    }))
}
