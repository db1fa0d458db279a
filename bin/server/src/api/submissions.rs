//! Submission archive uploads.

use axum::{
    Json,
    extract::{Multipart, multipart::MultipartRejection},
    http::StatusCode,
};
use repro_core::{IdPrefix, generate_id};
use serde::Serialize;

use super::{STATUS_QUEUED, extension, now_rfc3339, read_upload};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct SubmissionUploadResponse {
    pub submission_id: String,
    pub status: &'static str,
    pub filename: String,
    pub uploaded_at: String,
    pub bytes_read: u64,
    pub message: &'static str,
}

fn require_zip(filename: &str) -> Result<(), ApiError> {
    match extension(filename) {
        Some(ext) if ext.eq_ignore_ascii_case(".zip") => Ok(()),
        _ => Err(ApiError::bad_request(
            "invalid_file_type",
            "submission must be a .zip archive",
        )),
    }
}

/// `POST /api/v1/submissions`: accepts a `.zip` archive for evaluation.
pub async fn upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmissionUploadResponse>), ApiError> {
    let form = read_upload(multipart, "submission", require_zip).await?;
    let file = form.file.ok_or_else(|| {
        ApiError::bad_request("missing_submission_file", "submission zip file is required")
    })?;

    let submission_id =
        generate_id(IdPrefix::Submission).map_err(|e| ApiError::id_generation("submission", &e))?;
    tracing::info!(
        %submission_id,
        filename = %file.filename,
        bytes = file.bytes_read,
        "submission accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmissionUploadResponse {
            submission_id,
            status: STATUS_QUEUED,
            filename: file.filename,
            uploaded_at: now_rfc3339(),
            bytes_read: file.bytes_read,
            message: "submission accepted for evaluation",
        }),
    ))
}
