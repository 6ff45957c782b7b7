//! Credential comparison
//!
//! Clients hash the password before sending it, so the server only compares
//! what it stored at registration with what it receives at login. The
//! comparison is pluggable; the default is a constant-time byte equality.

/// Decides whether a presented credential matches the stored one
pub trait CredentialMatcher: Send + Sync {
    fn matches(&self, stored: &str, presented: &str) -> bool;
}

/// Constant-time byte equality
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl CredentialMatcher for ExactMatch {
    fn matches(&self, stored: &str, presented: &str) -> bool {
        constant_time_eq(stored.as_bytes(), presented.as_bytes())
    }
}

/// Compare two byte slices without short-circuiting on the first difference.
///
/// Only the length leaks through timing.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
