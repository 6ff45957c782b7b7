//! Session lifetime policy
//!
//! Maps the client class that requested issuance to access and refresh token
//! lifetimes. Browser extensions cannot refresh interactively as often as a
//! web session, so they get longer-lived credentials.

use chrono::Duration;

/// Source tag recorded for web sessions and used when none is given
pub const SOURCE_WEB: &str = "web";

/// Source tag sent by the browser extension
pub const SOURCE_EXTENSION: &str = "extension";

/// Access and refresh token lifetimes for one issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetimes {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Lifetimes {
    /// Lifetimes for un-sourced issuance (plain register/login)
    pub fn legacy() -> Self {
        Self {
            access_ttl: Duration::hours(24),
            refresh_ttl: Duration::days(7),
        }
    }
}

/// Lifetimes for a request source. Anything other than `"extension"` is a web session.
pub fn lifetimes(source: &str) -> Lifetimes {
    match source {
        SOURCE_EXTENSION => Lifetimes {
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(90),
        },
        _ => Lifetimes {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(30),
        },
    }
}

/// Empty source tags are recorded as `"web"`
pub fn normalize_source(source: &str) -> &str {
    if source.is_empty() {
        SOURCE_WEB
    } else {
        source
    }
}

/// How a register/login call selects its lifetimes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceMode {
    /// No source supplied: fixed 24 hour / 7 day lifetimes, recorded as `"web"`
    Legacy,
    /// Source-driven lifetimes
    Sourced(String),
}

impl IssuanceMode {
    /// `None` selects the legacy mode; any supplied tag (even empty) is sourced
    pub fn from_request(source: Option<&str>) -> Self {
        match source {
            None => IssuanceMode::Legacy,
            Some(s) => IssuanceMode::Sourced(normalize_source(s).to_string()),
        }
    }

    /// Source tag to persist on the refresh token
    pub fn source(&self) -> &str {
        match self {
            IssuanceMode::Legacy => SOURCE_WEB,
            IssuanceMode::Sourced(source) => source,
        }
    }

    pub fn lifetimes(&self) -> Lifetimes {
        match self {
            IssuanceMode::Legacy => Lifetimes::legacy(),
            IssuanceMode::Sourced(source) => lifetimes(source),
        }
    }
}
