//! PostgreSQL credential store tests
//!
//! Run with `TEST_DATABASE_URL` pointing at a disposable database and
//! `cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::PgPool;
    use std::sync::Arc;
    use uuid::Uuid;

    use study_assistant_server::auth::{AuthError, AuthService};
    use study_assistant_server::db;
    use study_assistant_server::models::{NewRefreshToken, NewUser, RegisterRequest};
    use study_assistant_server::store::{CredentialStore, PgCredentialStore, StoreError};

    /// Helper to create a migrated test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/study_assistant_test".to_string());

        let pool = db::create_pool(&database_url, 4)
            .await
            .expect("Failed to connect to test database");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn unique_email() -> String {
        format!("pg-{}@example.com", Uuid::new_v4())
    }

    async fn create_user(store: &PgCredentialStore) -> Uuid {
        store
            .create_user(NewUser {
                email: unique_email(),
                password: "client-side-hash".to_string(),
                name: "Pg Test".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn new_token(user_id: Uuid, hash: &str, ttl: Duration) -> NewRefreshToken {
        let now = Utc::now();
        NewRefreshToken {
            id: Uuid::new_v4(),
            token_hash: hash.to_string(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
            source: "web".to_string(),
            device_info: None,
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_duplicate_email_is_conflict() {
        let store = PgCredentialStore::new(setup_test_db().await);
        let email = unique_email();

        let user = NewUser {
            email: email.clone(),
            password: "a".to_string(),
            name: "A".to_string(),
        };
        store.create_user(user.clone()).await.unwrap();

        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_replace_is_single_use() {
        let store = PgCredentialStore::new(setup_test_db().await);
        let user_id = create_user(&store).await;
        let old_hash = format!("old-{}", Uuid::new_v4());

        store
            .create_refresh_token(new_token(user_id, &old_hash, Duration::days(30)))
            .await
            .unwrap();

        let first = store
            .replace_refresh_token(
                &old_hash,
                Utc::now(),
                new_token(user_id, &format!("new-{}", Uuid::new_v4()), Duration::days(30)),
            )
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .replace_refresh_token(
                &old_hash,
                Utc::now(),
                new_token(user_id, &format!("new-{}", Uuid::new_v4()), Duration::days(30)),
            )
            .await
            .unwrap();
        assert!(second.is_none());
        assert!(store.find_refresh_token(&old_hash).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_sweep_and_cascade() {
        let store = PgCredentialStore::new(setup_test_db().await);
        let user_id = create_user(&store).await;
        let expired_hash = format!("expired-{}", Uuid::new_v4());
        let live_hash = format!("live-{}", Uuid::new_v4());

        store
            .create_refresh_token(new_token(user_id, &expired_hash, -Duration::hours(1)))
            .await
            .unwrap();
        store
            .create_refresh_token(new_token(user_id, &live_hash, Duration::days(1)))
            .await
            .unwrap();

        assert!(store.delete_expired_refresh_tokens(Utc::now()).await.unwrap() >= 1);
        assert!(store.find_refresh_token(&expired_hash).await.unwrap().is_none());
        assert!(store.find_refresh_token(&live_hash).await.unwrap().is_some());

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(store.pool())
            .await
            .unwrap();
        assert!(store.find_refresh_token(&live_hash).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore] // Requires database setup
    async fn test_concurrent_refresh_one_winner() {
        let store: Arc<dyn CredentialStore> =
            Arc::new(PgCredentialStore::new(setup_test_db().await));
        let service = Arc::new(AuthService::new(
            store,
            "pg-test-secret-that-is-at-least-32-bytes",
        ));

        let tokens = service
            .register(&RegisterRequest {
                email: unique_email(),
                password: "client-side-hash".to_string(),
                name: "Racer".to_string(),
                source: Some("web".to_string()),
                device_info: None,
            })
            .await
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                let token = tokens.refresh_token.clone();
                tokio::spawn(async move { service.refresh_tokens(&token, None).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert_eq!(e, AuthError::InvalidOrUnknownRefreshToken),
            }
        }
        assert_eq!(successes, 1);
    }
}
