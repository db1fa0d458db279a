//! Cross-origin headers.
//!
//! The allowlist decides whether the request origin is echoed back; the
//! remaining CORS headers are identical on every response. Preflight
//! requests are answered here and never reach a handler.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ORIGIN,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use repro_platform_access::{OriginAllowlist, OriginDecision};
use std::sync::Arc;

pub const ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";
pub const ALLOW_HEADERS: &str = "Accept,Authorization,Content-Type,Origin,X-Requested-With";
pub const EXPOSE_HEADERS: &str = "Content-Length,Content-Type";
pub const MAX_AGE_SECONDS: &str = "86400";

/// Returns the request's `Origin` header, if it is valid UTF-8.
pub fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers.get(ORIGIN).and_then(|value| value.to_str().ok())
}

/// Writes the CORS headers for `decision` onto a response.
pub fn apply_cors_headers(headers: &mut HeaderMap, decision: &OriginDecision) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECONDS),
    );

    let Some(origin) = decision
        .allow_origin()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    else {
        return;
    };
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    if decision.allows_credentials() {
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
}

/// Middleware that applies the origin decision and short-circuits preflights.
pub async fn authorize_origin(
    State(allowlist): State<Arc<OriginAllowlist>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = allowlist.decide(request_origin(request.headers()));

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut(), &decision);
    response
}
