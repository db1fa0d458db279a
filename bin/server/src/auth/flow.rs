//! The OAuth login flow.
//!
//! A browser moves through three states: anonymous, pending (a login was
//! started and the post-login redirect is remembered) and authenticated.
//! Every failure after the provider round-trip degrades to a redirect to
//! the frontend's default page without touching the session. A session
//! cookie that cannot be read is replaced by a fresh session.

use axum::http::HeaderMap;
use axum::response::Response;
use axum_extra::extract::PrivateCookieJar;
use repro_platform_access::{
    AuthenticationError, OAuthIdentity, PendingAuthorization, ProviderProfile, ProviderRegistry,
    RedirectPath, SessionUser, UserDirectory,
};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::found;
use super::session::SessionStore;
use crate::error::ApiError;

/// Query parameters of a provider callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denied consent.
    pub error: Option<String>,
}

/// Body of `GET /api/v1/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

impl SessionStatus {
    fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }
}

/// Drives login start, provider callback, status and logout.
pub struct FlowController {
    providers: ProviderRegistry,
    directory: Arc<dyn UserDirectory>,
    sessions: SessionStore,
    frontend_url: String,
}

impl FlowController {
    pub fn new(
        providers: ProviderRegistry,
        directory: Arc<dyn UserDirectory>,
        sessions: SessionStore,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            directory,
            sessions,
            frontend_url: frontend_url.into(),
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Builds a `302` to `path` on the frontend.
    pub fn redirect_to_frontend(&self, path: &RedirectPath) -> Response {
        found(&format!("{}{}", self.frontend_url, path))
    }

    /// Starts a login with `provider`.
    ///
    /// The sanitized redirect is remembered in the session on a best-effort
    /// basis; the browser is then sent to the provider's consent screen.
    ///
    /// # Errors
    ///
    /// Returns `400` for a blank or unknown provider and `500` if the
    /// provider cannot build its consent URL.
    #[tracing::instrument(skip(self, headers, jar))]
    pub fn begin(
        &self,
        provider: &str,
        raw_redirect: Option<&str>,
        headers: &HeaderMap,
        jar: PrivateCookieJar,
    ) -> Result<(PrivateCookieJar, Response), ApiError> {
        let provider = self.providers.resolve(provider)?;
        let redirect = RedirectPath::sanitize(raw_redirect.unwrap_or_default());

        let mut session = self.sessions.load_or_fresh(headers);
        session.set_redirect_path(redirect);
        let jar = self
            .sessions
            .save_best_effort(&session, jar, "redirect path");

        let request = provider.authorization_request().map_err(|e| {
            tracing::error!(error = %e, provider = provider.name(), "failed to build authorization url");
            ApiError::internal("oauth_start_failed", "could not start oauth login")
        })?;
        let jar = self
            .sessions
            .save_pending(&request.pending, jar)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to persist oauth state");
                ApiError::internal("oauth_start_failed", "could not start oauth login")
            })?;

        Ok((jar, found(&request.url)))
    }

    async fn exchange(
        &self,
        provider: &str,
        query: &CallbackQuery,
        pending: Option<PendingAuthorization>,
    ) -> Result<OAuthIdentity, Report<AuthenticationError>> {
        let provider = self.providers.resolve(provider)?;
        let exchange_error = |reason: &str| AuthenticationError::ProviderExchange {
            provider: provider.name().to_string(),
            reason: reason.to_string(),
        };

        if let Some(error) = query.error.as_deref() {
            return Err(exchange_error(&format!("provider returned error: {error}")).into());
        }
        let pending = pending.ok_or_else(|| exchange_error("no pending login"))?;
        pending.verify(provider.name(), query.state.as_deref())?;
        let code = query
            .code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| exchange_error("missing authorization code"))?;

        let profile: ProviderProfile = provider.exchange(code, &pending).await?;
        Ok(OAuthIdentity::from_profile(provider.name(), profile))
    }

    /// Completes a login after the provider redirects back.
    ///
    /// Always answers with a `302` to the frontend. The session only gains a
    /// user when the exchange and the directory write both succeed.
    #[tracing::instrument(skip(self, query, headers, jar))]
    pub async fn complete(
        &self,
        provider: &str,
        query: &CallbackQuery,
        headers: &HeaderMap,
        jar: PrivateCookieJar,
    ) -> (PrivateCookieJar, Response) {
        let default = RedirectPath::default();
        let (jar, pending) = self.sessions.take_pending(jar);

        let identity = match self.exchange(provider, query, pending).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "oauth callback failed");
                return (jar, self.redirect_to_frontend(&default));
            }
        };

        let user = match self.directory.upsert_oauth_user(&identity).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "failed to upsert oauth user");
                return (jar, self.redirect_to_frontend(&default));
            }
        };

        let mut session = self.sessions.load_or_fresh(headers);
        let target = session.establish(&user);
        let jar = self
            .sessions
            .save_best_effort(&session, jar, "auth session");

        tracing::info!(user_id = %user.id(), provider = %user.provider(), "user logged in");
        (jar, self.redirect_to_frontend(&target))
    }

    /// Reports whether the request carries an authenticated session.
    ///
    /// Reads session fields only; the user directory is never consulted.
    pub fn status(&self, headers: &HeaderMap) -> SessionStatus {
        let session = match self.sessions.load(headers) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(error = %e, "treating unreadable session as anonymous");
                return SessionStatus::anonymous();
            }
        };
        match session.user() {
            Some(user) => SessionStatus {
                authenticated: true,
                user: Some(user),
            },
            None => SessionStatus::anonymous(),
        }
    }

    /// Clears the session and sends the browser to the frontend.
    pub fn logout(&self, jar: PrivateCookieJar) -> (PrivateCookieJar, Response) {
        let jar = self.sessions.clear(jar);
        (jar, self.redirect_to_frontend(&RedirectPath::default()))
    }
}
