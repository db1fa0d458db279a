//! Authentication module for the repro server.
//!
//! This module provides:
//! - The OAuth login flow (start, provider callback, status, logout)
//! - Private-cookie session storage
//! - The GitHub OAuth provider
//!
//! The session cookie caches a few identity claims so that status checks
//! never touch the user directory. The directory is only written during a
//! successful callback.

pub mod flow;
pub mod github;
pub mod routes;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

pub use flow::{CallbackQuery, FlowController, SessionStatus};
pub use github::GithubProvider;
pub use routes::{begin, begin_from_query, callback, logout, session_status};
pub use session::SessionStore;

/// Builds a `302 Found` redirect to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
