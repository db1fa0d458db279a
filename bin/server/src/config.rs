//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Every setting
//! has a development default, so an empty environment yields a runnable
//! (but insecure) local server.

use config::{Config, ConfigBuilder, ConfigError, builder::DefaultState};
use serde::Deserialize;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_SESSION_NAME: &str = "repro-auth";
const DEV_SESSION_SECRET: &str = "dev-session-secret-change-me";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Server configuration read from the environment.
///
/// Use the accessor methods rather than the raw fields; they apply
/// trimming and defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Listen address. A bare `:port` binds all interfaces.
    #[serde(default)]
    pub addr: Option<String>,

    /// Externally visible URL of this server.
    #[serde(default)]
    pub public_url: Option<String>,

    /// URL of the browser frontend that users are redirected to.
    #[serde(default)]
    pub frontend_url: Option<String>,

    /// Name of the session cookie.
    #[serde(default)]
    pub session_name: Option<String>,

    /// Secret the session cookie key is derived from.
    #[serde(default)]
    pub session_secret: Option<String>,

    /// Comma-separated list of allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Option<String>,

    #[serde(default)]
    pub github_client_id: Option<String>,

    #[serde(default)]
    pub github_client_secret: Option<String>,

    /// Overrides the GitHub callback URL derived from the public URL.
    #[serde(default)]
    pub github_callback_url: Option<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// Credentials for the GitHub OAuth app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn trim_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its setting.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Returns the socket address to bind.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        match non_blank(self.addr.as_ref()) {
            Some(addr) if addr.starts_with(':') => format!("0.0.0.0{addr}"),
            Some(addr) => addr.to_string(),
            None => DEFAULT_ADDR.to_string(),
        }
    }

    /// Returns the public URL without a trailing slash.
    #[must_use]
    pub fn public_url(&self) -> String {
        trim_url(non_blank(self.public_url.as_ref()).unwrap_or(DEFAULT_PUBLIC_URL))
    }

    /// Returns the frontend URL without a trailing slash.
    #[must_use]
    pub fn frontend_url(&self) -> String {
        trim_url(non_blank(self.frontend_url.as_ref()).unwrap_or(DEFAULT_FRONTEND_URL))
    }

    #[must_use]
    pub fn session_name(&self) -> String {
        non_blank(self.session_name.as_ref())
            .unwrap_or(DEFAULT_SESSION_NAME)
            .to_string()
    }

    /// Returns the configured session secret, or `None` if unset.
    #[must_use]
    pub fn session_secret(&self) -> Option<&str> {
        non_blank(self.session_secret.as_ref())
    }

    /// Returns the session secret, falling back to a fixed development value.
    #[must_use]
    pub fn session_secret_or_dev_default(&self) -> &str {
        self.session_secret().unwrap_or(DEV_SESSION_SECRET)
    }

    /// Cookies carry `Secure` only when the server is reached over HTTPS.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.public_url().starts_with("https://")
    }

    /// Returns the configured CORS origins, trimmed and without blanks.
    #[must_use]
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the GitHub credentials, or `None` if either is missing.
    #[must_use]
    pub fn github(&self) -> Option<GithubConfig> {
        let client_id = non_blank(self.github_client_id.as_ref())?;
        let client_secret = non_blank(self.github_client_secret.as_ref())?;
        let callback_url = non_blank(self.github_callback_url.as_ref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/auth/github/callback", self.public_url()));
        Some(GithubConfig {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            callback_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(pairs: &[(&str, &str)]) -> ServerConfig {
        let builder = pairs
            .iter()
            .fold(Config::builder(), |builder, (key, value)| {
                builder.set_override(*key, *value).unwrap()
            });
        ServerConfig::from_builder(builder).unwrap()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.public_url(), "http://localhost:8080");
        assert_eq!(config.frontend_url(), "http://localhost:3000");
        assert_eq!(config.session_name(), "repro-auth");
        assert_eq!(config.session_secret(), None);
        assert_eq!(config.session_secret_or_dev_default(), DEV_SESSION_SECRET);
        assert!(!config.secure_cookies());
        assert!(config.cors_origins().is_empty());
        assert!(config.github().is_none());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bare_port_binds_all_interfaces() {
        let config = load(&[("addr", ":9090")]);
        assert_eq!(config.listen_addr(), "0.0.0.0:9090");

        let config = load(&[("addr", "127.0.0.1:7000")]);
        assert_eq!(config.listen_addr(), "127.0.0.1:7000");
    }

    #[test]
    fn urls_are_trimmed() {
        let config = load(&[
            ("public_url", " https://api.example.com/ "),
            ("frontend_url", "https://app.example.com/"),
        ]);
        assert_eq!(config.public_url(), "https://api.example.com");
        assert_eq!(config.frontend_url(), "https://app.example.com");
        assert!(config.secure_cookies());
    }

    #[test]
    fn cors_origins_are_split_on_commas() {
        let config = load(&[(
            "cors_origins",
            "https://a.example.com, ,https://b.example.com ",
        )]);
        assert_eq!(
            config.cors_origins(),
            vec!["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn github_requires_both_credentials() {
        let config = load(&[("github_client_id", "id")]);
        assert!(config.github().is_none());

        let config = load(&[
            ("github_client_id", "id"),
            ("github_client_secret", "secret"),
            ("public_url", "https://api.example.com"),
        ]);
        let github = config.github().expect("configured");
        assert_eq!(
            github.callback_url,
            "https://api.example.com/auth/github/callback"
        );
    }

    #[test]
    fn github_callback_url_can_be_overridden() {
        let config = load(&[
            ("github_client_id", "id"),
            ("github_client_secret", "secret"),
            ("github_callback_url", "https://auth.example.com/cb"),
        ]);
        assert_eq!(
            config.github().map(|g| g.callback_url).as_deref(),
            Some("https://auth.example.com/cb")
        );
    }

    #[test]
    fn pretty_log_format_is_parsed() {
        let config = load(&[("log_format", "pretty")]);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
