//! Error types for the platform-access crate.
//!
//! Every variant is recoverable: user-input failures are reported back to the
//! client, the rest degrade to an unauthenticated redirect.

use std::fmt;

/// Errors from the OAuth login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No provider was named in the request.
    MissingProvider,
    /// The named provider is not registered.
    UnknownProvider { provider: String },
    /// The provider rejected or failed the code exchange.
    ProviderExchange { provider: String, reason: String },
    /// The user directory could not record the identity.
    DirectoryWrite { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProvider => {
                write!(f, "oauth provider is required")
            }
            Self::UnknownProvider { provider } => {
                write!(f, "oauth provider '{provider}' is not configured")
            }
            Self::ProviderExchange { provider, reason } => {
                write!(f, "oauth provider '{provider}' exchange failed: {reason}")
            }
            Self::DirectoryWrite { reason } => {
                write!(f, "failed to record oauth user: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_provider_display() {
        let err = AuthenticationError::MissingProvider;
        assert_eq!(err.to_string(), "oauth provider is required");
    }

    #[test]
    fn unknown_provider_display() {
        let err = AuthenticationError::UnknownProvider {
            provider: "gitlab".to_string(),
        };
        assert!(err.to_string().contains("gitlab"));
    }

    #[test]
    fn provider_exchange_display() {
        let err = AuthenticationError::ProviderExchange {
            provider: "github".to_string(),
            reason: "state mismatch".to_string(),
        };
        assert!(err.to_string().contains("github"));
        assert!(err.to_string().contains("state mismatch"));
    }

    #[test]
    fn directory_write_display() {
        let err = AuthenticationError::DirectoryWrite {
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("connection reset"));
    }
}
