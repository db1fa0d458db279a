//! Challenge specs and starter templates derived from a paper.

use axum::{Json, body::Bytes, extract::Path, http::StatusCode};
use repro_core::{IdPrefix, generate_id};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};

use super::{STATUS_QUEUED, require_id};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ChallengeSpecResponse {
    pub paper_id: String,
    pub title: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    pub steps: &'static [&'static str],
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateRequest {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub template_id: String,
    pub paper_id: String,
    pub language: String,
    pub status: &'static str,
    pub files: Vec<String>,
    pub message: &'static str,
}

/// Decodes exactly one JSON value of type `T` from `body`.
///
/// Unknown fields and anything but whitespace after the value are errors.
fn decode_strict<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    let mut stream = serde_json::Deserializer::from_slice(body).into_iter::<T>();
    let value = match stream.next() {
        Some(result) => result.map_err(|e| e.to_string())?,
        None => return Err("request body is required".to_string()),
    };

    let rest = &body[stream.byte_offset()..];
    match serde_json::Deserializer::from_slice(rest)
        .into_iter::<IgnoredAny>()
        .next()
    {
        None => Ok(value),
        Some(Ok(_)) => Err("unexpected extra JSON values".to_string()),
        Some(Err(e)) => Err(e.to_string()),
    }
}

/// Files a generated template will contain for `language`.
fn template_files(language: &str) -> Vec<String> {
    vec![
        "README.md".to_string(),
        format!("src/main.{}", language.to_lowercase()),
        "tests/spec_test.go".to_string(),
    ]
}

/// `GET /api/v1/challenges/{paper_id}`
pub async fn spec(Path(paper_id): Path<String>) -> Result<Json<ChallengeSpecResponse>, ApiError> {
    require_id(&paper_id, "missing_paper_id", "paper id is required")?;
    Ok(Json(ChallengeSpecResponse {
        paper_id,
        title: "Consensus log replication",
        description: "Implement the core mechanics described in the paper with deterministic tests.",
        tags: &["distributed-systems", "consensus", "log-replication"],
        steps: &[
            "Read the paper and extract the invariants.",
            "Implement the log replication algorithm.",
            "Write tests that prove safety under partitions.",
        ],
    }))
}

/// `POST /api/v1/challenges/{paper_id}/template`: queues template generation.
pub async fn template(
    Path(paper_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    require_id(&paper_id, "missing_paper_id", "paper id is required")?;

    let request: TemplateRequest =
        decode_strict(&body).map_err(|message| ApiError::bad_request("invalid_json", message))?;
    if request.language.trim().is_empty() {
        return Err(ApiError::bad_request(
            "missing_language",
            "language is required",
        ));
    }

    let template_id =
        generate_id(IdPrefix::Template).map_err(|e| ApiError::id_generation("template", &e))?;
    tracing::debug!(
        %template_id,
        %paper_id,
        language = %request.language,
        framework = request.framework.as_deref().unwrap_or_default(),
        "template generation queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(TemplateResponse {
            template_id,
            files: template_files(&request.language),
            paper_id,
            language: request.language,
            status: STATUS_QUEUED,
            message: "template generation queued",
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
        routing::{get, post},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/challenges/{paper_id}", get(spec))
            .route("/challenges/{paper_id}/template", post(template))
    }

    fn post_template(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/challenges/paper_1/template")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn strict_decoding() {
        let request: TemplateRequest = decode_strict(br#" {"language":"Go"} "#).unwrap();
        assert_eq!(request.language, "Go");

        assert_eq!(
            decode_strict::<TemplateRequest>(br#"{"language":"Go"} {}"#).unwrap_err(),
            "unexpected extra JSON values"
        );
        assert!(
            decode_strict::<TemplateRequest>(br#"{"language":"Go","extra":1}"#)
                .unwrap_err()
                .contains("unknown field")
        );
        assert_eq!(
            decode_strict::<TemplateRequest>(b"").unwrap_err(),
            "request body is required"
        );
    }

    #[tokio::test]
    async fn spec_is_fixed_for_any_paper() {
        let request = Request::builder()
            .uri("/challenges/paper_42")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["paper_id"], "paper_42");
        assert_eq!(body["title"], "Consensus log replication");
        assert_eq!(body["tags"].as_array().unwrap().len(), 3);
        assert_eq!(body["steps"][1], "Implement the log replication algorithm.");
    }

    #[tokio::test]
    async fn template_is_queued() {
        let (status, body) =
            send(post_template(r#"{"language":"Rust","framework":"tokio"}"#)).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body["template_id"].as_str().unwrap().starts_with("tmpl_"));
        assert_eq!(body["paper_id"], "paper_1");
        assert_eq!(body["language"], "Rust");
        assert_eq!(body["status"], "queued");
        assert_eq!(
            body["files"],
            serde_json::json!(["README.md", "src/main.rust", "tests/spec_test.go"])
        );
        assert_eq!(body["message"], "template generation queued");
    }

    #[tokio::test]
    async fn blank_language_is_rejected() {
        let (status, body) = send(post_template(r#"{"language":"  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_language");

        let (_, body) = send(post_template("{}")).await;
        assert_eq!(body["error"], "missing_language");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let (status, body) = send(post_template(r#"{"language":"Go"}{"language":"C"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_json");
        assert_eq!(body["message"], "unexpected extra JSON values");

        let (status, body) = send(post_template("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_json");
    }
}
