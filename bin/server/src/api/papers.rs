//! Paper upload and processing status.

use axum::{
    Json,
    extract::{Multipart, Path, multipart::MultipartRejection},
    http::StatusCode,
};
use repro_core::{IdPrefix, generate_id};
use serde::Serialize;

use super::{STATUS_PROCESSING, base_name, now_rfc3339, read_upload, require_id};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct PaperUploadResponse {
    pub id: String,
    pub status: &'static str,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub uploaded_at: String,
    pub message: &'static str,
    pub bytes_read: u64,
}

#[derive(Debug, Serialize)]
pub struct PaperStatusResponse {
    pub id: String,
    pub status: &'static str,
    pub updated_at: String,
    pub progress_percent: u8,
    pub message: &'static str,
}

/// Where an inferred paper title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Form,
    Filename,
}

impl TitleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Filename => "filename",
        }
    }
}

/// Picks a display title for an uploaded paper.
///
/// A non-blank `title` form field wins. Otherwise the file name without
/// its extension is used, with `_` and `-` read as spaces, upper-cased.
pub fn infer_title(form_title: Option<&str>, filename: &str) -> Option<(String, TitleSource)> {
    if let Some(title) = form_title.map(str::trim).filter(|t| !t.is_empty()) {
        return Some((title.to_string(), TitleSource::Form));
    }

    let base = base_name(filename);
    let stem = base.rfind('.').map_or(base, |index| &base[..index]);
    let stem = stem.replace(['_', '-'], " ");
    let stem = stem.trim();
    if stem.is_empty() {
        return None;
    }
    Some((stem.to_uppercase(), TitleSource::Filename))
}

/// `POST /api/v1/papers`: accepts a `paper` file for processing.
pub async fn upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<PaperUploadResponse>), ApiError> {
    let form = read_upload(multipart, "paper", |_| Ok(())).await?;
    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("missing_paper_file", "paper file is required"))?;

    let title = infer_title(
        form.fields.get("title").map(String::as_str),
        &file.filename,
    );
    if let Some((title, source)) = &title {
        tracing::info!(
            paper_title = %title,
            source = source.as_str(),
            filename = %file.filename,
            "paper title extracted"
        );
    }

    let id = generate_id(IdPrefix::Paper).map_err(|e| ApiError::id_generation("paper", &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PaperUploadResponse {
            id,
            status: STATUS_PROCESSING,
            filename: file.filename,
            title: title.map(|(title, _)| title),
            uploaded_at: now_rfc3339(),
            message: "paper accepted for processing",
            bytes_read: file.bytes_read,
        }),
    ))
}

/// `GET /api/v1/papers/{id}`: reports processing progress.
pub async fn status(Path(id): Path<String>) -> Result<Json<PaperStatusResponse>, ApiError> {
    require_id(&id, "missing_id", "paper id is required")?;
    Ok(Json(PaperStatusResponse {
        id,
        status: STATUS_PROCESSING,
        updated_at: now_rfc3339(),
        progress_percent: 42,
        message: "paper is being processed",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::multipart_request;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
        routing::{get, post},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/papers", post(upload))
            .route("/papers/{id}", get(status))
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn form_title_wins() {
        assert_eq!(
            infer_title(Some("  Attention Is All You Need "), "x.pdf"),
            Some(("Attention Is All You Need".to_string(), TitleSource::Form))
        );
    }

    #[test]
    fn title_falls_back_to_file_name() {
        assert_eq!(
            infer_title(Some("   "), "uploads/raft_consensus-paper.pdf"),
            Some(("RAFT CONSENSUS PAPER".to_string(), TitleSource::Filename))
        );
        assert_eq!(infer_title(None, "___.pdf"), None);
        assert_eq!(infer_title(None, ""), None);
    }

    #[tokio::test]
    async fn upload_is_accepted() {
        let request = multipart_request(
            "/papers",
            &[
                ("paper", Some("paxos_made-simple.pdf"), "%PDF-1.4 body".as_bytes()),
                ("notes", None, "ignored".as_bytes()),
            ],
        );
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json(response).await;
        assert!(body["id"].as_str().unwrap().starts_with("paper_"));
        assert_eq!(body["id"].as_str().unwrap().len(), "paper_".len() + 32);
        assert_eq!(body["status"], "processing");
        assert_eq!(body["filename"], "paxos_made-simple.pdf");
        assert_eq!(body["title"], "PAXOS MADE SIMPLE");
        assert_eq!(body["bytes_read"], 13);
        assert_eq!(body["message"], "paper accepted for processing");
    }

    #[tokio::test]
    async fn upload_uses_form_title() {
        let request = multipart_request(
            "/papers",
            &[
                ("title", None, "Raft".as_bytes()),
                ("paper", Some("p.pdf"), "x".as_bytes()),
            ],
        );
        let body = json(app().oneshot(request).await.unwrap()).await;
        assert_eq!(body["title"], "Raft");
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let request = multipart_request("/papers", &[("title", None, "Raft".as_bytes())]);
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "missing_paper_file");
    }

    #[tokio::test]
    async fn non_multipart_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/papers")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "invalid_multipart");
    }

    #[tokio::test]
    async fn status_reports_progress() {
        let request = Request::builder()
            .uri("/papers/paper_abc")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["id"], "paper_abc");
        assert_eq!(body["progress_percent"], 42);
        assert_eq!(body["status"], "processing");
    }
}
