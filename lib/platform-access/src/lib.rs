//! Platform access for the repro gateway.
//!
//! This crate provides the transport-independent half of authentication:
//! - OAuth identities and the users they resolve to (`OAuthIdentity`, `AuthenticatedUser`)
//! - The `UserDirectory` collaborator and an in-memory implementation
//! - The `OAuthProvider` abstraction and the startup-built `ProviderRegistry`
//! - The typed cookie session payload (`Session`)
//! - Post-login redirect sanitization (`RedirectPath`)
//! - The cross-origin allowlist and its decision function (`OriginAllowlist`)
//!
//! # Example
//!
//! ```
//! use repro_platform_access::{
//!     AuthenticatedUser, OAuthIdentity, ProviderProfile, RedirectPath, Session,
//! };
//!
//! let profile = ProviderProfile::new("42".to_string())
//!     .with_nickname(Some("octocat".to_string()));
//! let identity = OAuthIdentity::from_profile("github", profile);
//! assert_eq!(identity.name(), Some("octocat"));
//!
//! let user = AuthenticatedUser::from_identity(&identity);
//! assert_eq!(user.id(), "github:42");
//!
//! let mut session = Session::default();
//! session.set_redirect_path(RedirectPath::sanitize("/papers"));
//! let target = session.establish(&user);
//! assert_eq!(target.as_str(), "/papers");
//! assert!(session.is_authenticated());
//! ```

pub mod directory;
pub mod error;
pub mod origin;
pub mod provider;
pub mod redirect;
pub mod session;
pub mod user;

// Re-export main types at crate root
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use error::AuthenticationError;
pub use origin::{OriginAllowlist, OriginDecision};
pub use provider::{AuthorizationRequest, OAuthProvider, PendingAuthorization, ProviderRegistry};
pub use redirect::{DEFAULT_REDIRECT_PATH, RedirectPath};
pub use session::{Session, SessionUser};
pub use user::{AuthenticatedUser, OAuthIdentity, ProviderProfile, first_non_blank};
