//! Authentication models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Persisted refresh token record
///
/// Only the SHA-256 digest of the token string is stored.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub device_info: Option<String>,
}

impl RefreshToken {
    /// A record is usable strictly before its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Input for inserting a refresh token record
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub device_info: Option<String>,
}

impl NewRefreshToken {
    pub(crate) fn into_record(self) -> RefreshToken {
        RefreshToken {
            id: self.id,
            token_hash: self.token_hash,
            user_id: self.user_id,
            expires_at: self.expires_at,
            created_at: self.created_at,
            source: self.source,
            last_used_at: None,
            device_info: self.device_info,
        }
    }
}

/// Input for inserting a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Registration request. `password` is pre-hashed by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub source: Option<String>,
    pub device_info: Option<String>,
}

/// Login request. `password` is pre-hashed by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    pub source: Option<String>,
    pub device_info: Option<String>,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
    /// Client class performing the refresh; checked against the stored source when present
    pub source: Option<String>,
}

/// Logout request
#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// Auth tokens response
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}
