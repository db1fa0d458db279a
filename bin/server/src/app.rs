//! Router assembly and shared handler state.

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use repro_platform_access::OriginAllowlist;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::api::{self, MAX_UPLOAD_BYTES};
use crate::auth::{self, FlowController};
use crate::middleware::{authorize_origin, contain_panics, log_requests};

/// Requests running longer than this are answered with `408`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    flow: Arc<FlowController>,
    origins: Arc<OriginAllowlist>,
}

impl AppState {
    pub fn new(flow: FlowController, origins: OriginAllowlist) -> Self {
        Self {
            flow: Arc::new(flow),
            origins: Arc::new(origins),
        }
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn origins(&self) -> &Arc<OriginAllowlist> {
        &self.origins
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.flow.sessions().key().clone()
    }
}

/// Answers requests that outlive `limit` with `408 Request Timeout`.
fn request_timeout(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(auth::session_status))
        .route(
            "/papers",
            post(api::papers::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/papers/{id}", get(api::papers::status))
        .route("/challenges/{paper_id}", get(api::challenges::spec))
        .route(
            "/challenges/{paper_id}/template",
            post(api::challenges::template),
        )
        .route(
            "/submissions",
            post(api::submissions::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/ws/console/{submission_id}",
            get(api::console::console),
        )
}

/// Builds the gateway router.
///
/// Every request, matched or not, passes panic containment, then the access
/// log, then the CORS layer, then the request timeout.
pub fn router(state: AppState) -> Router {
    let origins = state.origins().clone();

    Router::new()
        .route("/auth", get(auth::begin_from_query))
        .route("/auth/", get(auth::begin_from_query))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
        .route("/auth/{provider}", get(auth::begin))
        .route("/auth/{provider}/callback", get(auth::callback))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(origins.clone(), contain_panics))
                .layer(from_fn(log_requests))
                .layer(from_fn_with_state(origins, authorize_origin))
                .layer(request_timeout(REQUEST_TIMEOUT)),
        )
        .with_state(state)
}
