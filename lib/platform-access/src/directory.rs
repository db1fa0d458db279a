//! The user directory collaborator.
//!
//! The login flow only needs one operation from persistent storage: record
//! an OAuth identity and hand back the resulting user. Implementations must
//! be idempotent per `(provider, provider_user_id)`.

use async_trait::async_trait;
use rootcause::Report;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::AuthenticationError;
use crate::user::{AuthenticatedUser, OAuthIdentity};

/// Storage for users created through OAuth logins.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Inserts or refreshes the user behind an OAuth identity.
    ///
    /// Repeated calls for the same `(provider, provider_user_id)` return the
    /// same user id and never create duplicates.
    async fn upsert_oauth_user(
        &self,
        identity: &OAuthIdentity,
    ) -> Result<AuthenticatedUser, Report<AuthenticationError>>;

    /// Reports whether the directory is reachable.
    async fn health(&self) -> Result<(), Report<AuthenticationError>> {
        Ok(())
    }
}

/// Process-local user directory.
///
/// Users live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, AuthenticatedUser>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a user by id.
    pub async fn get(&self, id: &str) -> Option<AuthenticatedUser> {
        self.users.read().await.get(id).cloned()
    }

    /// Returns the number of recorded users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns true if no users have been recorded.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert_oauth_user(
        &self,
        identity: &OAuthIdentity,
    ) -> Result<AuthenticatedUser, Report<AuthenticationError>> {
        let mut users = self.users.write().await;

        if let Some(id) = identity.stable_user_id() {
            if let Some(existing) = users.get_mut(&id) {
                existing.refresh_from(identity);
                tracing::debug!(user_id = %id, "refreshed oauth user");
                return Ok(existing.clone());
            }
        }

        let user = AuthenticatedUser::from_identity(identity);
        tracing::debug!(user_id = %user.id(), provider = %user.provider(), "created oauth user");
        users.insert(user.id().to_string(), user.clone());
        Ok(user)
    }
}
