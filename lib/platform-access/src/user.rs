//! OAuth identities and the platform users they resolve to.
//!
//! A provider hands back a raw [`ProviderProfile`]. The login flow turns it
//! into an immutable [`OAuthIdentity`], which the user directory resolves to an
//! [`AuthenticatedUser`]. A user's `id` is `provider:provider_user_id` whenever
//! both parts are known, so repeated logins land on the same record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returns the first candidate that is not blank.
///
/// Whitespace-only values count as blank. The returned value is not trimmed.
#[must_use]
pub fn first_non_blank<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.trim().is_empty())
}

/// Profile data as reported by an OAuth provider after a successful exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider-assigned user identifier.
    pub user_id: String,
    /// Display name, if the user set one.
    pub name: Option<String>,
    /// Login handle.
    pub nickname: Option<String>,
    /// Email address, if the provider disclosed one.
    pub email: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
}

impl ProviderProfile {
    /// Creates a profile for the given provider-assigned user identifier.
    #[must_use]
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Sets the login handle.
    #[must_use]
    pub fn with_nickname(mut self, nickname: Option<String>) -> Self {
        self.nickname = nickname;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }
}

/// Identity received from an OAuth provider.
///
/// Immutable once built; it is the only input the user directory sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthIdentity {
    provider: String,
    provider_user_id: String,
    name: Option<String>,
    email: Option<String>,
    nickname: Option<String>,
    avatar_url: Option<String>,
}

impl OAuthIdentity {
    /// Builds an identity from a provider profile.
    ///
    /// The name falls back to the nickname when the display name is blank.
    #[must_use]
    pub fn from_profile(provider: impl Into<String>, profile: ProviderProfile) -> Self {
        let name = first_non_blank(&[profile.name.as_deref(), profile.nickname.as_deref()])
            .map(str::to_string);
        Self {
            provider: provider.into(),
            provider_user_id: profile.user_id,
            name,
            email: profile.email,
            nickname: profile.nickname,
            avatar_url: profile.avatar_url,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the provider-assigned user identifier.
    #[must_use]
    pub fn provider_user_id(&self) -> &str {
        &self.provider_user_id
    }

    /// Returns the resolved display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the login handle.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Returns the avatar URL.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    /// Returns the stable user id for this identity, if it has one.
    ///
    /// Identities missing either the provider or the provider user id have no
    /// stable id.
    #[must_use]
    pub fn stable_user_id(&self) -> Option<String> {
        if self.provider.trim().is_empty() || self.provider_user_id.trim().is_empty() {
            return None;
        }
        Some(format!("{}:{}", self.provider, self.provider_user_id))
    }

    /// Returns the user id for this identity.
    ///
    /// Falls back to a random `user_<16 hex>` id when no stable id exists.
    #[must_use]
    pub fn user_id(&self) -> String {
        self.stable_user_id().unwrap_or_else(|| {
            repro_core::random_hex(8)
                .map(|suffix| format!("user_{suffix}"))
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "falling back to placeholder user id");
                    "user_unknown".to_string()
                })
        })
    }
}

/// A platform user materialized from an OAuth identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    id: String,
    provider: String,
    provider_user_id: String,
    name: Option<String>,
    email: Option<String>,
    nickname: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    /// Creates a new user record for an identity seen for the first time.
    #[must_use]
    pub fn from_identity(identity: &OAuthIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: identity.user_id(),
            provider: identity.provider.clone(),
            provider_user_id: identity.provider_user_id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            nickname: identity.nickname.clone(),
            avatar_url: identity.avatar_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copies the profile fields of a fresh login onto this record.
    ///
    /// The id, provider and creation time are kept.
    pub fn refresh_from(&mut self, identity: &OAuthIdentity) {
        self.name = identity.name.clone();
        self.email = identity.email.clone();
        self.nickname = identity.nickname.clone();
        self.avatar_url = identity.avatar_url.clone();
        self.updated_at = Utc::now();
    }

    /// Returns the platform user id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the provider-assigned user identifier.
    #[must_use]
    pub fn provider_user_id(&self) -> &str {
        &self.provider_user_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the login handle.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Returns the avatar URL.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    /// Returns when the user was first recorded.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the user was last refreshed.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octocat() -> ProviderProfile {
        ProviderProfile::new("583231".to_string())
            .with_name(Some("The Octocat".to_string()))
            .with_nickname(Some("octocat".to_string()))
            .with_email(Some("octocat@example.com".to_string()))
            .with_avatar_url(Some("https://avatars.example.com/583231".to_string()))
    }

    #[test]
    fn first_non_blank_skips_whitespace() {
        assert_eq!(first_non_blank(&[Some("  "), Some("b")]), Some("b"));
        assert_eq!(first_non_blank(&[None, Some("a"), Some("b")]), Some("a"));
        assert_eq!(first_non_blank(&[None, Some(""), Some("\t")]), None);
    }

    #[test]
    fn identity_prefers_display_name() {
        let identity = OAuthIdentity::from_profile("github", octocat());
        assert_eq!(identity.name(), Some("The Octocat"));
        assert_eq!(identity.nickname(), Some("octocat"));
    }

    #[test]
    fn identity_name_falls_back_to_nickname() {
        let profile = octocat().with_name(Some("   ".to_string()));
        let identity = OAuthIdentity::from_profile("github", profile);
        assert_eq!(identity.name(), Some("octocat"));
    }

    #[test]
    fn identity_without_any_name() {
        let profile = ProviderProfile::new("1".to_string());
        let identity = OAuthIdentity::from_profile("github", profile);
        assert_eq!(identity.name(), None);
    }

    #[test]
    fn stable_user_id_combines_provider_and_subject() {
        let identity = OAuthIdentity::from_profile("github", octocat());
        assert_eq!(identity.stable_user_id().as_deref(), Some("github:583231"));
        assert_eq!(identity.user_id(), "github:583231");
    }

    #[test]
    fn missing_subject_gets_random_fallback_id() {
        let identity = OAuthIdentity::from_profile("github", ProviderProfile::default());
        assert!(identity.stable_user_id().is_none());

        let first = identity.user_id();
        let second = identity.user_id();
        assert!(first.starts_with("user_"));
        assert_eq!(first.len(), "user_".len() + 16);
        assert_ne!(first, second);
    }

    #[test]
    fn missing_provider_gets_random_fallback_id() {
        let identity = OAuthIdentity::from_profile("", octocat());
        assert!(identity.user_id().starts_with("user_"));
    }

    #[test]
    fn user_from_identity_copies_fields() {
        let identity = OAuthIdentity::from_profile("github", octocat());
        let user = AuthenticatedUser::from_identity(&identity);

        assert_eq!(user.id(), "github:583231");
        assert_eq!(user.provider(), "github");
        assert_eq!(user.provider_user_id(), "583231");
        assert_eq!(user.name(), Some("The Octocat"));
        assert_eq!(user.email(), Some("octocat@example.com"));
        assert_eq!(user.nickname(), Some("octocat"));
        assert_eq!(
            user.avatar_url(),
            Some("https://avatars.example.com/583231")
        );
        assert_eq!(user.created_at(), user.updated_at());
    }

    #[test]
    fn refresh_keeps_id_and_creation_time() {
        let identity = OAuthIdentity::from_profile("github", octocat());
        let mut user = AuthenticatedUser::from_identity(&identity);
        let created = user.created_at();

        std::thread::sleep(std::time::Duration::from_millis(1));

        let renamed = OAuthIdentity::from_profile(
            "github",
            octocat().with_email(Some("new@example.com".to_string())),
        );
        user.refresh_from(&renamed);

        assert_eq!(user.id(), "github:583231");
        assert_eq!(user.email(), Some("new@example.com"));
        assert_eq!(user.created_at(), created);
        assert!(user.updated_at() > created);
    }
}
