//! Authentication routes for login, callback, logout and session status.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use super::flow::{CallbackQuery, SessionStatus};
use crate::app::AppState;
use crate::error::ApiError;

/// Query parameters for starting a login.
#[derive(Debug, Default, Deserialize)]
pub struct BeginQuery {
    /// Provider name, used when the path does not carry one.
    provider: Option<String>,
    /// Frontend path to land on after login.
    redirect: Option<String>,
}

/// Starts a login with the provider named in the path.
pub async fn begin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<BeginQuery>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), ApiError> {
    state
        .flow()
        .begin(&provider, query.redirect.as_deref(), &headers, jar)
}

/// Starts a login at `/auth` or `/auth/`, taking the provider from `?provider=`.
pub async fn begin_from_query(
    State(state): State<AppState>,
    Query(query): Query<BeginQuery>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Response), ApiError> {
    let provider = query.provider.as_deref().unwrap_or_default();
    state
        .flow()
        .begin(provider, query.redirect.as_deref(), &headers, jar)
}

/// Handles the provider redirect after the user consents (or refuses).
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Response) {
    state.flow().complete(&provider, &query, &headers, jar).await
}

/// Clears the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Response) {
    state.flow().logout(jar)
}

/// Reports the current session.
pub async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionStatus> {
    Json(state.flow().status(&headers))
}
