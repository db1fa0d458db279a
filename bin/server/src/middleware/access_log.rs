//! One structured log line per request.

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, Request},
    http::{Method, header::USER_AGENT},
    middleware::Next,
    response::Response,
};
use futures::StreamExt;
use std::net::SocketAddr;
use std::time::Instant;

/// A request's log line, emitted when dropped.
///
/// For streamed responses it travels with the body, so `bytes` and the
/// duration cover everything written before the body finished or was
/// abandoned.
struct RequestLog {
    start: Instant,
    method: Method,
    path: String,
    status: u16,
    bytes: u64,
    remote: String,
    user_agent: String,
}

impl Drop for RequestLog {
    fn drop(&mut self) {
        tracing::info!(
            method = %self.method,
            path = %self.path,
            status = self.status,
            bytes = self.bytes,
            duration = ?self.start.elapsed(),
            remote = %self.remote,
            user_agent = %self.user_agent,
            "request"
        );
    }
}

/// Wraps `body` so every data chunk is added to `log.bytes`.
fn counted(body: Body, mut log: RequestLog) -> Body {
    Body::from_stream(body.into_data_stream().inspect(move |chunk| {
        if let Ok(data) = chunk {
            log.bytes += data.len() as u64;
        }
    }))
}

/// Middleware that logs method, path, status, size, latency and client.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    let mut log = RequestLog {
        start,
        method,
        path,
        status: response.status().as_u16(),
        bytes: 0,
        remote,
        user_agent,
    };

    // Sized bodies keep their length so the server can still send
    // `Content-Length`.
    if let Some(len) = response.body().size_hint().exact() {
        log.bytes = len;
        drop(log);
        return response;
    }

    let (parts, body) = response.into_parts();
    Response::from_parts(parts, counted(body, log))
}
