//! GitHub OAuth provider.
//!
//! Authorization code flow with PKCE against GitHub's OAuth app endpoints,
//! followed by a profile lookup on the REST API. GitHub only reports a
//! public email on `/user`, so a missing address is filled in from the
//! user's primary verified email.

use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use repro_platform_access::{
    AuthenticationError, AuthorizationRequest, OAuthProvider, PendingAuthorization,
    ProviderProfile,
};
use rootcause::Report;
use serde::Deserialize;

use crate::config::GithubConfig;

/// Provider name used in routes and user ids.
pub const GITHUB_PROVIDER: &str = "github";

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_SCOPES: &[&str] = &["user:email"];
const USER_AGENT: &str = concat!("repro-server/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: Option<String>,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl From<GithubUser> for ProviderProfile {
    fn from(user: GithubUser) -> Self {
        ProviderProfile::new(user.id.to_string())
            .with_name(user.name)
            .with_nickname(user.login)
            .with_email(user.email)
            .with_avatar_url(user.avatar_url)
    }
}

fn exchange_error(reason: impl Into<String>) -> AuthenticationError {
    AuthenticationError::ProviderExchange {
        provider: GITHUB_PROVIDER.to_string(),
        reason: reason.into(),
    }
}

/// GitHub OAuth app client.
#[derive(Debug, Clone)]
pub struct GithubProvider {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    auth_url: String,
    token_url: String,
    api_url: String,
}

impl GithubProvider {
    /// Creates a provider from configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the callback URL is not a valid URL.
    pub fn new(config: &GithubConfig) -> Result<Self, Report<AuthenticationError>> {
        RedirectUrl::new(config.callback_url.clone())
            .map_err(|e| exchange_error(format!("invalid callback URL: {e}")))?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.callback_url.clone(),
            auth_url: GITHUB_AUTH_URL.to_string(),
            token_url: GITHUB_TOKEN_URL.to_string(),
            api_url: GITHUB_API_URL.to_string(),
        })
    }

    fn urls(&self) -> Result<(AuthUrl, TokenUrl, RedirectUrl), AuthenticationError> {
        let auth = AuthUrl::new(self.auth_url.clone())
            .map_err(|e| exchange_error(format!("invalid auth URL: {e}")))?;
        let token = TokenUrl::new(self.token_url.clone())
            .map_err(|e| exchange_error(format!("invalid token URL: {e}")))?;
        let redirect = RedirectUrl::new(self.redirect_url.clone())
            .map_err(|e| exchange_error(format!("invalid callback URL: {e}")))?;
        Ok((auth, token, redirect))
    }

    async fn fetch_user(
        &self,
        http: &reqwest::Client,
        token: &str,
    ) -> Result<GithubUser, AuthenticationError> {
        http.get(format!("{}/user", self.api_url))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| exchange_error(format!("profile request failed: {e}")))?
            .json()
            .await
            .map_err(|e| exchange_error(format!("invalid profile response: {e}")))
    }

    async fn fetch_primary_email(
        &self,
        http: &reqwest::Client,
        token: &str,
    ) -> Result<Option<String>, AuthenticationError> {
        let emails: Vec<GithubEmail> = http
            .get(format!("{}/user/emails", self.api_url))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| exchange_error(format!("email request failed: {e}")))?
            .json()
            .await
            .map_err(|e| exchange_error(format!("invalid email response: {e}")))?;

        Ok(emails
            .into_iter()
            .find(|email| email.primary && email.verified)
            .map(|email| email.email))
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn name(&self) -> &str {
        GITHUB_PROVIDER
    }

    fn authorization_request(&self) -> Result<AuthorizationRequest, Report<AuthenticationError>> {
        let (auth_url, token_url, redirect_url) = self.urls()?;
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);
        for scope in GITHUB_SCOPES {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }

        let (url, csrf_token) = auth_request.url();

        Ok(AuthorizationRequest {
            url: url.to_string(),
            pending: PendingAuthorization {
                provider: GITHUB_PROVIDER.to_string(),
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        })
    }

    #[tracing::instrument(skip_all, fields(provider = GITHUB_PROVIDER))]
    async fn exchange(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<ProviderProfile, Report<AuthenticationError>> {
        let (auth_url, token_url, redirect_url) = self.urls()?;
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| exchange_error(format!("HTTP client error: {e}")))?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier.clone()))
            .request_async(&http)
            .await
            .map_err(|e| exchange_error(format!("token exchange failed: {e}")))?;
        let access_token = token.access_token().secret();

        let user = self.fetch_user(&http, access_token).await?;
        let mut profile = ProviderProfile::from(user);

        if profile.email.as_deref().is_none_or(|e| e.trim().is_empty()) {
            match self.fetch_primary_email(&http, access_token).await {
                Ok(email) => profile.email = email,
                Err(e) => tracing::warn!(error = %e, "could not fetch github email"),
            }
        }

        tracing::debug!(provider_user_id = %profile.user_id, "fetched github profile");
        Ok(profile)
    }
}
