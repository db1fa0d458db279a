//! Test doubles shared by the auth and router tests.

use async_trait::async_trait;
use axum::http::{
    HeaderMap,
    header::{COOKIE, SET_COOKIE},
};
use axum::response::Response;
use repro_platform_access::{
    AuthenticatedUser, AuthenticationError, AuthorizationRequest, OAuthIdentity, OAuthProvider,
    PendingAuthorization, ProviderProfile, UserDirectory,
};
use rootcause::Report;
use std::collections::BTreeMap;

/// In-process OAuth provider with a fixed consent URL and state.
pub struct FakeProvider {
    fail_exchange: bool,
}

impl FakeProvider {
    pub const NAME: &'static str = "fake";
    pub const CONSENT_URL: &'static str = "https://provider.example.com/authorize?client_id=fake";
    pub const STATE: &'static str = "fake-state";

    pub fn succeeding() -> Self {
        Self {
            fail_exchange: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_exchange: true,
        }
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn authorization_request(&self) -> Result<AuthorizationRequest, Report<AuthenticationError>> {
        Ok(AuthorizationRequest {
            url: Self::CONSENT_URL.to_string(),
            pending: PendingAuthorization {
                provider: Self::NAME.to_string(),
                csrf_token: Self::STATE.to_string(),
                pkce_verifier: "fake-verifier".to_string(),
            },
        })
    }

    async fn exchange(
        &self,
        code: &str,
        pending: &PendingAuthorization,
    ) -> Result<ProviderProfile, Report<AuthenticationError>> {
        if self.fail_exchange || pending.pkce_verifier != "fake-verifier" || code.is_empty() {
            return Err(AuthenticationError::ProviderExchange {
                provider: Self::NAME.to_string(),
                reason: "code rejected".to_string(),
            }
            .into());
        }
        Ok(ProviderProfile::new("1001".to_string())
            .with_name(Some("Ada Lovelace".to_string()))
            .with_nickname(Some("ada".to_string()))
            .with_email(Some("ada@example.com".to_string())))
    }
}

/// Applies a response's `Set-Cookie` headers to a browser's cookie state
/// and returns the `Cookie` header the browser would send next.
pub fn cookie_headers(response: &Response, previous: &HeaderMap) -> HeaderMap {
    let mut cookies = parse_cookies(previous);

    for set_cookie in response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
    {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if set_cookie.contains("Max-Age=0") {
            cookies.remove(name);
        } else {
            cookies.insert(name.to_string(), value.to_string());
        }
    }

    to_headers(&cookies)
}

/// Returns `previous` with cookie `name` set to the raw `value`.
pub fn with_cookie(previous: &HeaderMap, name: &str, value: &str) -> HeaderMap {
    let mut cookies = parse_cookies(previous);
    cookies.insert(name.to_string(), value.to_string());
    to_headers(&cookies)
}

fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn to_headers(cookies: &BTreeMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if !cookies.is_empty() {
        let header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert(COOKIE, header.parse().unwrap());
    }
    headers
}

/// User directory whose writes always fail.
pub struct BrokenDirectory;

#[async_trait]
impl UserDirectory for BrokenDirectory {
    async fn upsert_oauth_user(
        &self,
        _identity: &OAuthIdentity,
    ) -> Result<AuthenticatedUser, Report<AuthenticationError>> {
        Err(AuthenticationError::DirectoryWrite {
            reason: "directory offline".to_string(),
        }
        .into())
    }
}
