//! Credential storage
//!
//! Durable storage for users and refresh token records. The auth core only
//! talks to the [`CredentialStore`] trait; rotation atomicity is delegated
//! to [`CredentialStore::replace_refresh_token`].

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewRefreshToken, NewUser, RefreshToken, User};

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint was violated (duplicate email or token digest)
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage interface consumed by the auth core
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by exact (case-sensitive) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Create a new user; a duplicate email yields [`StoreError::Conflict`]
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Persist changes to an existing user
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    /// Find a refresh token record by its digest
    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>>;

    /// Insert a refresh token record; a duplicate digest yields [`StoreError::Conflict`]
    async fn create_refresh_token(&self, token: NewRefreshToken) -> StoreResult<RefreshToken>;

    /// Stamp the last-used timestamp of a record
    async fn update_refresh_token_last_used(
        &self,
        id: Uuid,
        used_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Delete a record by digest, returning the number of rows removed
    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<u64>;

    /// Delete every record with `expires_at < now`, returning the number removed
    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Atomically delete the unexpired record `old_hash` and insert `new_token`.
    ///
    /// Returns `Ok(None)` without inserting anything if `old_hash` was not
    /// present (or already expired) at the moment of deletion. Of any number of
    /// concurrent calls with the same `old_hash`, at most one returns `Some`.
    async fn replace_refresh_token(
        &self,
        old_hash: &str,
        now: DateTime<Utc>,
        new_token: NewRefreshToken,
    ) -> StoreResult<Option<RefreshToken>>;

    /// Connectivity check for health endpoints
    async fn ping(&self) -> StoreResult<()>;
}
