//! OAuth provider abstraction and the startup-built provider registry.
//!
//! A provider knows how to build its consent-screen URL and how to turn an
//! authorization code into a [`ProviderProfile`]. The registry is assembled
//! once during startup and shared read-only afterwards.

use async_trait::async_trait;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::AuthenticationError;
use crate::user::ProviderProfile;

/// State that must survive the browser's round-trip through the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// Provider the flow was started with.
    pub provider: String,
    /// CSRF token sent as the OAuth `state` parameter.
    pub csrf_token: String,
    /// PKCE code verifier.
    pub pkce_verifier: String,
}

impl PendingAuthorization {
    /// Checks a callback against the state issued when the flow began.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::ProviderExchange`] when the callback
    /// is for a different provider or carries a different `state`.
    pub fn verify(&self, provider: &str, state: Option<&str>) -> Result<(), AuthenticationError> {
        let reason = if self.provider != provider {
            "callback provider does not match the pending login"
        } else if state != Some(self.csrf_token.as_str()) {
            "state mismatch"
        } else {
            return Ok(());
        };
        Err(AuthenticationError::ProviderExchange {
            provider: provider.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// Where to send the browser, and what to remember until it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Consent-screen URL.
    pub url: String,
    /// State to keep until the callback.
    pub pending: PendingAuthorization,
}

/// An external OAuth identity issuer.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Returns the provider's route name (e.g. `github`).
    fn name(&self) -> &str;

    /// Builds the consent-screen redirect for a new login.
    fn authorization_request(&self) -> Result<AuthorizationRequest, Report<AuthenticationError>>;

    /// Exchanges an authorization code for the user's profile.
    async fn exchange(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<ProviderProfile, Report<AuthenticationError>>;
}

/// Immutable set of configured providers, keyed by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn OAuthProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider, replacing any provider of the same name.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Resolves a provider by name.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::MissingProvider`] for a blank name and
    /// [`AuthenticationError::UnknownProvider`] for an unregistered one.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn OAuthProvider>, AuthenticationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthenticationError::MissingProvider);
        }
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| AuthenticationError::UnknownProvider {
                provider: name.to_string(),
            })
    }

    /// Returns the registered provider names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Returns true if no providers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
