//! Opaque identifiers for resources created by the gateway.
//!
//! Identifiers have the form `<prefix>_<32 hex chars>`, built from 16 bytes
//! drawn from the operating system's randomness source. 128 bits of entropy
//! is what callers rely on for uniqueness; nothing here checks for
//! collisions.

use rootcause::Report;
use std::fmt;

/// Number of random bytes behind a resource identifier.
pub const ID_ENTROPY_BYTES: usize = 16;

/// Error returned when the randomness source cannot be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyError {
    /// Description reported by the randomness source.
    pub reason: String,
}

impl fmt::Display for EntropyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "randomness source unavailable: {}", self.reason)
    }
}

impl std::error::Error for EntropyError {}

/// Well-known prefixes for gateway resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdPrefix {
    /// An uploaded paper.
    Paper,
    /// A generated challenge template.
    Template,
    /// An uploaded submission archive.
    Submission,
}

impl IdPrefix {
    /// Returns the textual prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Template => "tmpl",
            Self::Submission => "sub",
        }
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `len` random bytes encoded as lowercase hex.
///
/// # Errors
///
/// Returns [`EntropyError`] if the operating system randomness source fails.
pub fn random_hex(len: usize) -> Result<String, Report<EntropyError>> {
    let mut buf = vec![0u8; len];
    getrandom::fill(&mut buf).map_err(|e| EntropyError {
        reason: e.to_string(),
    })?;
    Ok(hex::encode(buf))
}

/// Generates a new identifier of the form `<prefix>_<32 hex chars>`.
///
/// # Errors
///
/// Returns [`EntropyError`] if the operating system randomness source fails.
pub fn generate_id(prefix: impl fmt::Display) -> Result<String, Report<EntropyError>> {
    let suffix = random_hex(ID_ENTROPY_BYTES)?;
    Ok(format!("{prefix}_{suffix}"))
}
