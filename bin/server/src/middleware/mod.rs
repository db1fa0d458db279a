//! Request-safety middleware shared by every route.
//!
//! Layers, outermost first:
//! 1. panic containment
//! 2. access logging
//! 3. origin authorization (CORS)
//! 4. request timeout

pub mod access_log;
pub mod cors;
pub mod panic;

pub use access_log::log_requests;
pub use cors::{apply_cors_headers, authorize_origin};
pub use panic::contain_panics;
