//! Panic containment.
//!
//! A panicking handler is turned into a JSON `500`; the connection and the
//! process keep serving.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use repro_platform_access::OriginAllowlist;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::cors::{apply_cors_headers, request_origin};
use crate::error::ApiError;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Middleware that catches panics from everything it wraps.
///
/// The `500` carries the same CORS headers the request would otherwise
/// have received, so browsers can read the error.
pub async fn contain_panics(
    State(allowlist): State<Arc<OriginAllowlist>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let origin = request_origin(request.headers()).map(str::to_string);

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            tracing::error!(
                %method,
                %path,
                panic = panic_message(&*payload),
                "panic recovered"
            );
            let mut response = ApiError::unexpected().into_response();
            apply_cors_headers(
                response.headers_mut(),
                &allowlist.decide(origin.as_deref()),
            );
            response
        }
    }
}
