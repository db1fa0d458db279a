//! Cookie-backed session storage.
//!
//! The whole [`Session`] is serialized as JSON into one private cookie,
//! encrypted and authenticated with a key derived from the configured
//! secret. A second short-lived private cookie carries the provider state
//! (CSRF token and PKCE verifier) between login start and callback.

use axum::http::HeaderMap;
use axum_extra::extract::{
    CookieJar, PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use repro_platform_access::{PendingAuthorization, Session};
use rootcause::Report;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::error::SessionError;

/// How long a session cookie lives.
pub const SESSION_MAX_AGE_DAYS: i64 = 30;

/// How long a started login may take before its state cookie expires.
pub const PENDING_MAX_AGE_MINUTES: i64 = 10;

/// Reads and writes the session and pending-login cookies.
#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    cookie_name: String,
    pending_cookie_name: String,
    secure: bool,
}

impl SessionStore {
    /// Creates a store whose cookie key is the SHA-512 digest of `secret`.
    pub fn new(secret: &str, cookie_name: impl Into<String>, secure: bool) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        let cookie_name = cookie_name.into();
        Self {
            key: Key::from(digest.as_slice()),
            pending_cookie_name: format!("{cookie_name}_oauth"),
            cookie_name,
            secure,
        }
    }

    /// Returns the cookie encryption key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn pending_cookie_name(&self) -> &str {
        &self.pending_cookie_name
    }

    /// Loads the session sent with a request.
    ///
    /// A request without a session cookie gets a fresh, empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Absent`] when the cookie fails decryption and
    /// [`SessionError::Malformed`] when its payload is not a session.
    pub fn load(&self, headers: &HeaderMap) -> Result<Session, Report<SessionError>> {
        if CookieJar::from_headers(headers)
            .get(&self.cookie_name)
            .is_none()
        {
            return Ok(Session::default());
        }

        let jar = PrivateCookieJar::from_headers(headers, self.key.clone());
        let cookie = jar.get(&self.cookie_name).ok_or(SessionError::Absent)?;
        let session = serde_json::from_str(cookie.value()).map_err(|e| SessionError::Malformed {
            reason: e.to_string(),
        })?;
        Ok(session)
    }

    /// Loads the session, treating an unreadable cookie like a missing one.
    ///
    /// Saving the returned session overwrites the unreadable cookie, so a
    /// cookie sealed with a rotated secret stops failing on the next write.
    pub fn load_or_fresh(&self, headers: &HeaderMap) -> Session {
        self.load(headers).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable auth session");
            Session::default()
        })
    }

    /// Serializes the session into its (not yet encrypted) cookie.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] if the session cannot be serialized.
    pub fn encode(&self, session: &Session) -> Result<Cookie<'static>, Report<SessionError>> {
        let value = serde_json::to_string(session).map_err(|e| SessionError::Encode {
            reason: e.to_string(),
        })?;
        Ok(Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
            .build())
    }

    /// Writes the session into the response jar.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] if the session cannot be serialized.
    pub fn save(
        &self,
        session: &Session,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Report<SessionError>> {
        Ok(jar.add(self.encode(session)?))
    }

    /// Writes the session into the response jar, logging a failure instead
    /// of returning it. `what` names the write in the log line.
    #[must_use]
    pub fn save_best_effort(
        &self,
        session: &Session,
        jar: PrivateCookieJar,
        what: &str,
    ) -> PrivateCookieJar {
        match self.encode(session) {
            Ok(cookie) => jar.add(cookie),
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist {what}");
                jar
            }
        }
    }

    /// Removes the session cookie.
    #[must_use]
    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/"))
    }

    /// Stores the provider state of a login that is being started.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] if the state cannot be serialized.
    pub fn save_pending(
        &self,
        pending: &PendingAuthorization,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Report<SessionError>> {
        let value = serde_json::to_string(pending).map_err(|e| SessionError::Encode {
            reason: e.to_string(),
        })?;
        let cookie = Cookie::build((self.pending_cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::minutes(PENDING_MAX_AGE_MINUTES))
            .build();
        Ok(jar.add(cookie))
    }

    /// Removes the pending-login cookie and returns its contents.
    ///
    /// Missing, tampered and unparsable cookies all yield `None`.
    pub fn take_pending(
        &self,
        jar: PrivateCookieJar,
    ) -> (PrivateCookieJar, Option<PendingAuthorization>) {
        let pending = jar
            .get(&self.pending_cookie_name)
            .and_then(|cookie| match serde_json::from_str(cookie.value()) {
                Ok(pending) => Some(pending),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed oauth state cookie");
                    None
                }
            });
        let jar = jar.remove(Cookie::build((self.pending_cookie_name.clone(), "")).path("/"));
        (jar, pending)
    }
}
