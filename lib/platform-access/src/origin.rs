//! Cross-origin allowlist and the per-request CORS decision.
//!
//! The allowlist is built once at startup and never changes afterwards, so
//! it can be shared across requests without synchronization.

use std::collections::HashSet;

/// The wildcard entry that allows every origin.
pub const WILDCARD_ORIGIN: &str = "*";

/// Origins allowed to read credentialed responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginAllowlist {
    /// Any origin may read responses, but never with credentials.
    Any,
    /// Only these normalized origins may read responses.
    Listed(HashSet<String>),
}

/// Outcome of checking a request origin against the allowlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// Emit `Access-Control-Allow-Origin: *` without credentials.
    Wildcard,
    /// Echo the origin back and allow credentials.
    Echo(String),
    /// Emit no allow-origin header.
    Omit,
}

impl OriginDecision {
    /// Returns the `Access-Control-Allow-Origin` value, if any.
    #[must_use]
    pub fn allow_origin(&self) -> Option<&str> {
        match self {
            Self::Wildcard => Some(WILDCARD_ORIGIN),
            Self::Echo(origin) => Some(origin),
            Self::Omit => None,
        }
    }

    /// Returns true if credentials may accompany the response.
    #[must_use]
    pub fn allows_credentials(&self) -> bool {
        matches!(self, Self::Echo(_))
    }
}

/// Trims surrounding whitespace and trailing slashes from an origin.
#[must_use]
pub fn normalize_origin(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}

impl OriginAllowlist {
    /// Builds an allowlist from configured origins.
    ///
    /// Blank entries are skipped. When nothing usable remains, `fallback`
    /// (normally the frontend URL) is the only allowed origin.
    #[must_use]
    pub fn from_origins<I, S>(origins: I, fallback: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: HashSet<String> = origins
            .into_iter()
            .map(|origin| normalize_origin(origin.as_ref()).to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if normalized.is_empty() {
            let fallback = normalize_origin(fallback);
            if !fallback.is_empty() {
                normalized.insert(fallback.to_string());
            }
        }

        if normalized.contains(WILDCARD_ORIGIN) {
            return Self::Any;
        }
        Self::Listed(normalized)
    }

    /// Returns true if this allowlist admits every origin.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Decides which CORS headers a request with this `Origin` receives.
    #[must_use]
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        match self {
            Self::Any => OriginDecision::Wildcard,
            Self::Listed(allowed) => {
                let Some(origin) = origin.map(str::trim).filter(|o| !o.is_empty()) else {
                    return OriginDecision::Omit;
                };
                if allowed.contains(normalize_origin(origin)) {
                    OriginDecision::Echo(origin.to_string())
                } else {
                    OriginDecision::Omit
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONTEND: &str = "http://localhost:3000";

    fn listed() -> OriginAllowlist {
        OriginAllowlist::from_origins(
            ["https://app.example.com/", " https://admin.example.com "],
            FRONTEND,
        )
    }

    #[test]
    fn listed_origins_are_normalized() {
        let OriginAllowlist::Listed(origins) = listed() else {
            panic!("expected listed allowlist");
        };
        assert!(origins.contains("https://app.example.com"));
        assert!(origins.contains("https://admin.example.com"));
        assert_eq!(origins.len(), 2);
    }

    #[test]
    fn empty_configuration_falls_back_to_frontend() {
        let allowlist = OriginAllowlist::from_origins(["", "  "], "http://localhost:3000/");
        assert_eq!(
            allowlist.decide(Some(FRONTEND)),
            OriginDecision::Echo(FRONTEND.to_string())
        );
    }

    #[test]
    fn allowed_origin_is_echoed_with_credentials() {
        let allowlist = listed();
        for origin in ["https://app.example.com", "https://admin.example.com"] {
            let decision = allowlist.decide(Some(origin));
            assert_eq!(decision.allow_origin(), Some(origin));
            assert!(decision.allows_credentials());
        }
    }

    #[test]
    fn origin_with_trailing_slash_is_matched() {
        let decision = listed().decide(Some("https://app.example.com/"));
        assert!(decision.allows_credentials());
    }

    #[test]
    fn unknown_origin_is_omitted() {
        let decision = listed().decide(Some("https://evil.example.com"));
        assert_eq!(decision, OriginDecision::Omit);
        assert_eq!(decision.allow_origin(), None);
        assert!(!decision.allows_credentials());
    }

    #[test]
    fn missing_origin_is_omitted() {
        assert_eq!(listed().decide(None), OriginDecision::Omit);
        assert_eq!(listed().decide(Some("  ")), OriginDecision::Omit);
    }

    #[test]
    fn wildcard_never_allows_credentials() {
        let allowlist = OriginAllowlist::from_origins(["https://app.example.com", "*"], FRONTEND);
        assert!(allowlist.is_wildcard());

        for origin in [None, Some("https://app.example.com"), Some("https://other.example")] {
            let decision = allowlist.decide(origin);
            assert_eq!(decision.allow_origin(), Some(WILDCARD_ORIGIN));
            assert!(!decision.allows_credentials());
        }
    }
}
