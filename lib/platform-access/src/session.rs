//! Typed payload of the browser session.
//!
//! The session lives entirely in a client-held private cookie; this type is
//! what gets serialized into it, as a single unit. A session without a
//! non-blank `user_id` is anonymous.

use serde::{Deserialize, Serialize};

use crate::redirect::RedirectPath;
use crate::user::AuthenticatedUser;

/// Claims cached in the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Where to land after the provider round-trip. Consumed on callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    redirect_path: Option<RedirectPath>,
}

/// The authenticated view of a session, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

impl Session {
    /// Returns true if the session carries a non-blank user id.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    /// Returns the user id, if the session is authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .filter(|user_id| !user_id.trim().is_empty())
    }

    /// Returns the provider that authenticated this session.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns the cached display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the cached email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the pending post-login redirect, if one was stored.
    #[must_use]
    pub fn redirect_path(&self) -> Option<&RedirectPath> {
        self.redirect_path.as_ref()
    }

    /// Remembers where to send the user once the provider calls back.
    pub fn set_redirect_path(&mut self, path: RedirectPath) {
        self.redirect_path = Some(path);
    }

    /// Removes and returns the pending redirect, re-sanitized.
    pub fn take_redirect_path(&mut self) -> Option<RedirectPath> {
        self.redirect_path
            .take()
            .map(|path| RedirectPath::sanitize(path.as_str()))
    }

    /// Records a confirmed user in the session and consumes the pending
    /// redirect.
    ///
    /// Returns where the user should land: the stored redirect, or the
    /// default path.
    pub fn establish(&mut self, user: &AuthenticatedUser) -> RedirectPath {
        self.user_id = Some(user.id().to_string());
        self.provider = Some(user.provider().to_string());
        self.name = user.name().map(str::to_string);
        self.email = user.email().map(str::to_string);
        self.take_redirect_path().unwrap_or_default()
    }

    /// Returns the client-facing user view, if authenticated.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        let id = self.user_id()?.to_string();
        Some(SessionUser {
            id,
            name: non_blank(self.name()),
            email: non_blank(self.email()),
            provider: non_blank(self.provider()),
        })
    }
}
