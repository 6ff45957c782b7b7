//! In-memory credential store
//!
//! Used by tests and for running the server without Postgres. Rotation holds
//! the write lock across its delete and insert, so concurrent replacements of
//! one token have a single winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError, StoreResult};
use crate::models::{NewRefreshToken, NewUser, RefreshToken, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Keyed by token digest
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// In-memory [`CredentialStore`]
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a refresh token record verbatim, bypassing uniqueness checks
    pub async fn insert_refresh_token(&self, record: RefreshToken) {
        self.tables
            .write()
            .await
            .refresh_tokens
            .insert(record.token_hash.clone(), record);
    }

    /// Remove a user outright
    pub async fn remove_user(&self, id: Uuid) -> Option<User> {
        self.tables.write().await.users.remove(&id)
    }

    /// Snapshot of every refresh token record owned by a user
    pub async fn refresh_tokens_for_user(&self, user_id: Uuid) -> Vec<RefreshToken> {
        self.tables
            .read()
            .await
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of refresh token records held
    pub async fn refresh_token_count(&self) -> usize {
        self.tables.read().await.refresh_tokens.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users.email".to_string()));
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());

        Ok(row)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict("users.email".to_string()));
        }

        if let Some(existing) = tables.users.get_mut(&user.id) {
            *existing = User {
                updated_at: Utc::now(),
                ..user.clone()
            };
        }

        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(self
            .tables
            .read()
            .await
            .refresh_tokens
            .get(token_hash)
            .cloned())
    }

    async fn create_refresh_token(&self, token: NewRefreshToken) -> StoreResult<RefreshToken> {
        let mut tables = self.tables.write().await;

        if tables.refresh_tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Conflict("refresh_tokens.token_hash".to_string()));
        }

        let record = token.into_record();
        tables
            .refresh_tokens
            .insert(record.token_hash.clone(), record.clone());

        Ok(record)
    }

    async fn update_refresh_token_last_used(
        &self,
        id: Uuid,
        used_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if let Some(record) = tables.refresh_tokens.values_mut().find(|t| t.id == id) {
            record.last_used_at = Some(used_at);
        }

        Ok(())
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<u64> {
        let removed = self.tables.write().await.refresh_tokens.remove(token_hash);
        Ok(u64::from(removed.is_some()))
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.expires_at >= now);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn replace_refresh_token(
        &self,
        old_hash: &str,
        now: DateTime<Utc>,
        new_token: NewRefreshToken,
    ) -> StoreResult<Option<RefreshToken>> {
        let mut tables = self.tables.write().await;

        match tables.refresh_tokens.get(old_hash) {
            Some(old) if old.expires_at > now => {}
            _ => return Ok(None),
        }

        if tables.refresh_tokens.contains_key(&new_token.token_hash) {
            return Err(StoreError::Conflict("refresh_tokens.token_hash".to_string()));
        }

        tables.refresh_tokens.remove(old_hash);
        let record = new_token.into_record();
        tables
            .refresh_tokens
            .insert(record.token_hash.clone(), record.clone());

        Ok(Some(record))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
