//! The submission console endpoint.

use axum::{
    Json,
    extract::Path,
    http::{HeaderMap, StatusCode, header::UPGRADE},
};
use serde::Serialize;

use super::require_id;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ConsoleResponse {
    pub submission_id: String,
    pub message: &'static str,
}

fn wants_websocket(headers: &HeaderMap) -> bool {
    headers
        .get(UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

/// `GET /api/v1/ws/console/{submission_id}`
///
/// Only validates the upgrade request; the console itself answers `501`.
pub async fn console(
    Path(submission_id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<ConsoleResponse>), ApiError> {
    require_id(
        &submission_id,
        "missing_submission_id",
        "submission id is required",
    )?;
    if !wants_websocket(&headers) {
        return Err(ApiError::new(
            StatusCode::UPGRADE_REQUIRED,
            "upgrade_required",
            "websocket upgrade required",
        ));
    }

    Ok((
        StatusCode::NOT_IMPLEMENTED,
        Json(ConsoleResponse {
            submission_id,
            message: "websocket console not implemented yet",
        }),
    ))
}
