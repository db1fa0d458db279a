//! repro gateway HTTP server.
//!
//! Hosts the OAuth login flow backed by an encrypted cookie session, the
//! placeholder `/api/v1` endpoints and the middleware chain that wraps them.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
