//! Post-login redirect sanitization.
//!
//! Clients may ask to land on a specific page after logging in. Only
//! same-site absolute paths are honored; anything else (absolute URLs,
//! protocol-relative `//host` forms, relative paths) collapses to
//! [`DEFAULT_REDIRECT_PATH`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where users land when no usable redirect was requested.
pub const DEFAULT_REDIRECT_PATH: &str = "/home";

/// A redirect target that starts with exactly one `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectPath(String);

impl RedirectPath {
    /// Sanitizes a client-supplied redirect target.
    ///
    /// Never fails; unusable input yields the default path.
    #[must_use]
    pub fn sanitize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.starts_with('/') || trimmed.starts_with("//") {
            return Self::default();
        }
        Self(trimmed.to_string())
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RedirectPath {
    fn default() -> Self {
        Self(DEFAULT_REDIRECT_PATH.to_string())
    }
}

impl fmt::Display for RedirectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RedirectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
