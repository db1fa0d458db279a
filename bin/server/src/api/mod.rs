//! Placeholder `/api/v1` endpoints.
//!
//! Storage, metadata extraction, template generation and evaluation live
//! in other services. These handlers validate input, assign identifiers and
//! answer with the shape those services will eventually fill in.

pub mod challenges;
pub mod console;
pub mod papers;
pub mod submissions;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;

use crate::error::ApiError;

/// Upper bound on an upload request body.
pub const MAX_UPLOAD_BYTES: usize = 50 << 20;

pub(crate) const STATUS_QUEUED: &str = "queued";
pub(crate) const STATUS_PROCESSING: &str = "processing";

/// Current time as an RFC 3339 UTC timestamp with second precision.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Rejects path identifiers that are empty after trimming.
pub(crate) fn require_id(
    id: &str,
    code: &'static str,
    message: &'static str,
) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::bad_request(code, message));
    }
    Ok(())
}

/// The file part of an upload, drained without being stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadedFile {
    pub filename: String,
    pub bytes_read: u64,
}

/// A parsed multipart upload.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

fn invalid_multipart() -> ApiError {
    ApiError::bad_request("invalid_multipart", "failed to parse multipart form")
}

/// Reads a multipart upload whose file part is named `file_field`.
///
/// `accept` sees the file name before the content is read and may reject
/// it. Text parts are collected into `fields`; the first file part wins.
pub(crate) async fn read_upload<F>(
    multipart: Result<Multipart, MultipartRejection>,
    file_field: &str,
    accept: F,
) -> Result<UploadForm, ApiError>
where
    F: Fn(&str) -> Result<(), ApiError>,
{
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "rejected multipart request");
        invalid_multipart()
    })?;
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!(error = %e, "malformed multipart body");
        invalid_multipart()
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            if name != file_field || form.file.is_some() {
                continue;
            }
            accept(&filename)?;

            let mut bytes_read = 0_u64;
            while let Some(chunk) = field.chunk().await.map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    return invalid_multipart();
                }
                tracing::warn!(error = %e, filename = %filename, "failed to read upload");
                ApiError::internal("upload_failed", "failed to read uploaded file")
            })? {
                bytes_read += chunk.len() as u64;
            }
            form.file = Some(UploadedFile {
                filename,
                bytes_read,
            });
        } else {
            let value = field.text().await.map_err(|_| invalid_multipart())?;
            form.fields.entry(name).or_insert(value);
        }
    }

    Ok(form)
}

/// Returns the last path component of an uploaded file name.
pub(crate) fn base_name(filename: &str) -> &str {
    let trimmed = filename.trim();
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Returns the extension of `filename` including the dot, if any.
pub(crate) fn extension(filename: &str) -> Option<&str> {
    let base = base_name(filename);
    base.rfind('.').map(|index| &base[index..])
}
