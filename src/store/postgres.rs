//! PostgreSQL credential store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreResult};
use crate::models::{NewRefreshToken, NewUser, RefreshToken, User};

/// PostgreSQL-backed [`CredentialStore`]
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, email, password, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = $1, password = $2, name = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> StoreResult<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, token_hash, user_id, expires_at, created_at, source, last_used_at, device_info
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn create_refresh_token(&self, token: NewRefreshToken) -> StoreResult<RefreshToken> {
        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at, created_at, source, device_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, token_hash, user_id, expires_at, created_at, source, last_used_at, device_info
            "#,
        )
        .bind(token.id)
        .bind(&token.token_hash)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(token.created_at)
        .bind(&token.source)
        .bind(&token.device_info)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_refresh_token_last_used(
        &self,
        id: Uuid,
        used_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE refresh_tokens SET last_used_at = $1 WHERE id = $2")
            .bind(used_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn replace_refresh_token(
        &self,
        old_hash: &str,
        now: DateTime<Utc>,
        new_token: NewRefreshToken,
    ) -> StoreResult<Option<RefreshToken>> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken by DELETE serializes concurrent rotations; the
        // losers see zero affected rows once the winner commits.
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE token_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(old_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, token_hash, user_id, expires_at, created_at, source, device_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, token_hash, user_id, expires_at, created_at, source, last_used_at, device_info
            "#,
        )
        .bind(new_token.id)
        .bind(&new_token.token_hash)
        .bind(new_token.user_id)
        .bind(new_token.expires_at)
        .bind(new_token.created_at)
        .bind(&new_token.source)
        .bind(&new_token.device_info)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(row))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
