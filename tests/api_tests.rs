//! HTTP surface tests over the in-memory credential store

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use study_assistant_server::routes::{app_router, cors_layer};
    use study_assistant_server::state::AppState;
    use study_assistant_server::store::MemoryCredentialStore;

    const SECRET: &str = "api-test-secret-that-is-at-least-32b";

    fn app_with_store() -> (Router, MemoryCredentialStore) {
        let store = MemoryCredentialStore::new();
        let state = AppState::from_store(Arc::new(store.clone()), SECRET);
        let router = app_router(state, cors_layer(&["http://localhost:3000".to_string()]));
        (router, store)
    }

    fn app() -> Router {
        app_with_store().0
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_me(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/api/v1/auth/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, email: &str, source: Option<&str>) -> Value {
        let mut body = json!({
            "email": email,
            "password": "client-side-hash",
            "name": "Test Student",
        });
        if let Some(source) = source {
            body["source"] = json!(source);
        }

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/register", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_returns_tokens_with_no_store() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/register",
                json!({
                    "email": "student@example.com",
                    "password": "client-side-hash",
                    "name": "Student",
                    "source": "web"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        assert!(response.headers().contains_key("x-request-id"));

        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["expires_in"], 900);
        assert_eq!(body["data"]["user"]["email"], "student@example.com");
        assert!(body["data"]["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_and_invalid() {
        let app = app();
        register(&app, "dup@example.com", None).await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/register",
                json!({"email": "dup@example.com", "password": "x", "name": "Dup"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(post_json(
                "/api/v1/auth/register",
                json!({"email": "not-an-email", "password": "x", "name": "Bad"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let app = app();
        register(&app, "login@example.com", None).await;

        let response = app
            .oneshot(post_json(
                "/api/v1/auth/login",
                json!({"email": "login@example.com", "password": "wrong"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_me_requires_valid_bearer() {
        let app = app();
        let registered = register(&app, "me@example.com", Some("web")).await;
        let access = registered["data"]["access_token"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(get_me(Some(&format!("Bearer {access}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["data"]["email"], "me@example.com");

        for header_value in [None, Some("Token abc"), Some("Bearer "), Some("Bearer garbage")] {
            let response = app.clone().oneshot(get_me(header_value)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{header_value:?}");
            assert_eq!(read_json(response).await["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_expired_access_token_reports_token_expired() {
        let app = app();
        let registered = register(&app, "late@example.com", Some("web")).await;
        let user_id = registered["data"]["user"]["id"].as_str().unwrap();

        let expired = study_assistant_server::auth::TokenCodec::new(SECRET)
            .issue_access_at(
                user_id,
                "late@example.com",
                Duration::minutes(15),
                Utc::now() - Duration::hours(1),
            )
            .unwrap();

        let response = app
            .oneshot(get_me(Some(&format!("Bearer {expired}"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await["error"]["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_reuse() {
        let app = app();
        let registered = register(&app, "rotate@example.com", Some("extension")).await;
        let refresh = registered["data"]["refresh_token"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/refresh",
                json!({"refresh_token": refresh, "source": "extension"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        let body = read_json(response).await;
        assert_eq!(body["data"]["expires_in"], 3600);
        assert_ne!(body["data"]["refresh_token"], json!(refresh));

        let response = app
            .oneshot(post_json(
                "/api/v1/auth/refresh",
                json!({"refresh_token": refresh}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(response).await["error"]["code"],
            "INVALID_REFRESH_TOKEN"
        );
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_owner_matches_unknown_token() {
        let (app, store) = app_with_store();
        let registered = register(&app, "removed@example.com", Some("web")).await;
        let refresh = registered["data"]["refresh_token"].as_str().unwrap().to_string();
        let user_id: Uuid = registered["data"]["user"]["id"].as_str().unwrap().parse().unwrap();

        store.remove_user(user_id).await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/refresh",
                json!({"refresh_token": refresh}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let owner_gone = read_json(response).await;
        assert_eq!(owner_gone["error"]["code"], "INVALID_REFRESH_TOKEN");

        let response = app
            .oneshot(post_json(
                "/api/v1/auth/refresh",
                json!({"refresh_token": "never-issued"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await, owner_gone);
    }

    #[tokio::test]
    async fn test_logout_unknown_token_succeeds() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/auth/logout",
                json!({"refresh_token": "not-a-real-token"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["success"], true);
    }
}
