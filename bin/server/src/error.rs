//! Domain error types for server operations.
//!
//! Handler failures are reported to clients as [`ApiError`], a JSON body of
//! the form `{"error": code, "message": detail}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use repro_core::EntropyError;
use repro_platform_access::AuthenticationError;
use rootcause::Report;
use serde::Serialize;
use std::fmt;

/// Cookie session errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session cookie was sent but could not be decrypted or authenticated.
    Absent,
    /// The cookie decrypted but the payload is not a session.
    Malformed { reason: String },
    /// The session could not be serialized into a cookie.
    Encode { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "session cookie failed authentication"),
            Self::Malformed { reason } => write!(f, "session cookie is malformed: {reason}"),
            Self::Encode { reason } => write!(f, "failed to encode session: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Error response returned by API handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    /// The response for a panic caught by the middleware chain.
    pub fn unexpected() -> Self {
        Self::internal("internal_server_error", "unexpected server error")
    }

    /// Maps an identifier generation failure for `resource` to a 500.
    pub fn id_generation(resource: &str, report: &Report<EntropyError>) -> Self {
        tracing::error!(error = %report, resource, "failed to generate id");
        Self::internal(
            "id_generation_failed",
            format!("could not generate {resource} id"),
        )
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(err: AuthenticationError) -> Self {
        let code = match &err {
            AuthenticationError::MissingProvider => "missing_provider",
            AuthenticationError::UnknownProvider { .. } => "unknown_provider",
            AuthenticationError::ProviderExchange { .. } => {
                return Self::internal("oauth_start_failed", "could not start oauth login");
            }
            AuthenticationError::DirectoryWrite { .. } => {
                return Self::internal("directory_unavailable", "could not record user");
            }
        };
        Self::bad_request(code, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}
