//! Auth errors

use thiserror::Error;

use super::jwt::JwtError;
use crate::store::StoreError;

/// Authentication errors
///
/// Callers branch on the variant (or [`AuthError::code`]); the display text
/// is for logs and response messages only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingAuthorization,

    #[error("Invalid authorization header format")]
    MalformedHeader,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredAccessToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid refresh token")]
    InvalidOrUnknownRefreshToken,

    #[error("Refresh token expired")]
    ExpiredRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable discriminant for logs and metrics
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "MISSING_AUTHORIZATION",
            AuthError::MalformedHeader => "MALFORMED_HEADER",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::ExpiredAccessToken => "TOKEN_EXPIRED",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::InvalidOrUnknownRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::ExpiredRefreshToken => "EXPIRED_REFRESH_TOKEN",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::UserAlreadyExists => "USER_ALREADY_EXISTS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Malformed => AuthError::MalformedToken,
            JwtError::InvalidSignature => AuthError::InvalidSignature,
            JwtError::Expired => AuthError::ExpiredAccessToken,
            JwtError::EncodingFailed(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            // Callers that expect a conflict map it themselves
            StoreError::Conflict(msg) => AuthError::Internal(format!("unexpected conflict: {msg}")),
        }
    }
}
