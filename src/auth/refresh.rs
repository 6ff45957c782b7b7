//! Refresh token issuance and rotation
//!
//! Refresh tokens are opaque random strings. The store only ever sees their
//! SHA-256 digest, so a leaked table cannot be replayed against the API.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use super::error::AuthError;
use super::jwt::TokenCodec;
use super::policy::{self, normalize_source, IssuanceMode};
use crate::models::{NewRefreshToken, RefreshToken, User};
use crate::store::CredentialStore;

/// Result of a successful rotation
#[derive(Debug, Clone)]
pub struct RotatedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub access_ttl: Duration,
    pub user: User,
    /// The newly stored record
    pub record: RefreshToken,
}

/// Issues, rotates and revokes refresh tokens
#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
}

impl RefreshTokenManager {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Issue a refresh token for `source` with its policy lifetime
    pub async fn issue(
        &self,
        user_id: Uuid,
        source: &str,
        device_info: Option<&str>,
    ) -> Result<String, AuthError> {
        let mode = IssuanceMode::Sourced(normalize_source(source).to_string());
        self.issue_for_mode(user_id, &mode, device_info, Utc::now())
            .await
    }

    /// Issue a refresh token whose lifetime and recorded source follow `mode`
    pub async fn issue_for_mode(
        &self,
        user_id: Uuid,
        mode: &IssuanceMode,
        device_info: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let (token, record) = new_record(
            user_id,
            mode.source(),
            mode.lifetimes().refresh_ttl,
            device_info.map(str::to_string),
            now,
        );

        self.store.create_refresh_token(record).await?;

        tracing::debug!(user_id = %user_id, source = %mode.source(), "Refresh token issued");

        Ok(token)
    }

    /// Exchange a refresh token for a new access/refresh pair
    pub async fn rotate(&self, token: &str) -> Result<RotatedSession, AuthError> {
        self.rotate_at(token, None, Utc::now()).await
    }

    /// Rotate `token` as of `now`.
    ///
    /// When `expected_source` is given it must match the source the token was
    /// issued for; a mismatch reads as an unknown token and leaves the record
    /// in place. The successor inherits the consumed record's source and device info.
    pub async fn rotate_at(
        &self,
        token: &str,
        expected_source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RotatedSession, AuthError> {
        let token_hash = hash_token(token);

        let record = self
            .store
            .find_refresh_token(&token_hash)
            .await?
            .ok_or(AuthError::InvalidOrUnknownRefreshToken)?;

        if record.is_expired_at(now) {
            return Err(AuthError::ExpiredRefreshToken);
        }

        if let Some(expected) = expected_source {
            if normalize_source(expected) != record.source {
                tracing::warn!(
                    user_id = %record.user_id,
                    stored_source = %record.source,
                    "Refresh attempted from a different source"
                );
                return Err(AuthError::InvalidOrUnknownRefreshToken);
            }
        }

        let user = self
            .store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.store
            .update_refresh_token_last_used(record.id, now)
            .await?;

        let lifetimes = policy::lifetimes(&record.source);
        let access_token = self.codec.issue_access_at(
            &user.id.to_string(),
            &user.email,
            lifetimes.access_ttl,
            now,
        )?;

        let (refresh_token, successor) = new_record(
            user.id,
            &record.source,
            lifetimes.refresh_ttl,
            record.device_info.clone(),
            now,
        );

        let record = self
            .store
            .replace_refresh_token(&token_hash, now, successor)
            .await?
            // Another request rotated (or revoked) this token first
            .ok_or(AuthError::InvalidOrUnknownRefreshToken)?;

        tracing::info!(user_id = %user.id, source = %record.source, "Refresh token rotated");

        Ok(RotatedSession {
            access_token,
            refresh_token,
            access_ttl: lifetimes.access_ttl,
            user,
            record,
        })
    }

    /// Delete a refresh token. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let removed = self.store.delete_refresh_token(&hash_token(token)).await?;
        tracing::debug!(removed, "Refresh token revoked");
        Ok(())
    }

    /// Delete every record that expired before `now`
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let removed = self.store.delete_expired_refresh_tokens(now).await?;
        Ok(removed)
    }
}

/// Generate a token and the record that persists its digest
fn new_record(
    user_id: Uuid,
    source: &str,
    ttl: Duration,
    device_info: Option<String>,
    now: DateTime<Utc>,
) -> (String, NewRefreshToken) {
    let token = generate_refresh_token();
    let record = NewRefreshToken {
        id: Uuid::new_v4(),
        token_hash: hash_token(&token),
        user_id,
        expires_at: now + ttl,
        created_at: now,
        source: source.to_string(),
        device_info,
    };
    (token, record)
}

/// 256 bits from the thread-local CSPRNG, hex encoded
fn generate_refresh_token() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Hash a token for storage
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
