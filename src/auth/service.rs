//! Authentication service
//!
//! Registration, login, refresh and logout on top of the token codec and
//! the refresh token manager.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{AuthTokensResponse, LoginRequest, NewUser, RegisterRequest, User};
use crate::store::{CredentialStore, StoreError};

use super::credentials::{CredentialMatcher, ExactMatch};
use super::error::AuthError;
use super::jwt::{Claims, TokenCodec};
use super::policy::IssuanceMode;
use super::refresh::RefreshTokenManager;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    refresh: RefreshTokenManager,
    matcher: Arc<dyn CredentialMatcher>,
}

impl AuthService {
    /// Create a new AuthService comparing credentials byte-for-byte
    pub fn new(store: Arc<dyn CredentialStore>, jwt_secret: &str) -> Self {
        let codec = TokenCodec::new(jwt_secret);
        Self {
            refresh: RefreshTokenManager::new(store.clone(), codec.clone()),
            store,
            codec,
            matcher: Arc::new(ExactMatch),
        }
    }

    /// Replace the credential comparison
    pub fn with_matcher(mut self, matcher: Arc<dyn CredentialMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Register a new user and issue their first token pair
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthTokensResponse, AuthError> {
        self.register_at(req, Utc::now()).await
    }

    pub async fn register_at(
        &self,
        req: &RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthTokensResponse, AuthError> {
        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let user = self
            .store
            .create_user(NewUser {
                email: req.email.clone(),
                password: req.password.clone(),
                name: req.name.clone(),
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                StoreError::Conflict(_) => AuthError::UserAlreadyExists,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "User registered");

        let mode = IssuanceMode::from_request(req.source.as_deref());
        self.issue_session(user, &mode, req.device_info.as_deref(), now)
            .await
    }

    /// Authenticate with email and pre-hashed password
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthTokensResponse, AuthError> {
        self.login_at(req, Utc::now()).await
    }

    pub async fn login_at(
        &self,
        req: &LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthTokensResponse, AuthError> {
        let user = self
            .store
            .find_user_by_email(&req.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.matcher.matches(&user.password, &req.password) {
            tracing::debug!(user_id = %user.id, "Login rejected: credential mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let mode = IssuanceMode::from_request(req.source.as_deref());
        self.issue_session(user, &mode, req.device_info.as_deref(), now)
            .await
    }

    /// Refresh tokens using a valid refresh token
    pub async fn refresh_tokens(
        &self,
        refresh_token: &str,
        source: Option<&str>,
    ) -> Result<AuthTokensResponse, AuthError> {
        self.refresh_tokens_at(refresh_token, source, Utc::now())
            .await
    }

    pub async fn refresh_tokens_at(
        &self,
        refresh_token: &str,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthTokensResponse, AuthError> {
        let rotated = self.refresh.rotate_at(refresh_token, source, now).await?;

        Ok(AuthTokensResponse {
            access_token: rotated.access_token,
            refresh_token: rotated.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: rotated.access_ttl.num_seconds(),
            user: rotated.user.into(),
        })
    }

    /// Revoke a refresh token (logout). Unknown tokens are not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh.revoke(refresh_token).await
    }

    /// Verify an access token against the current time
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.codec.verify_access(token)?)
    }

    pub fn verify_access_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        Ok(self.codec.verify_access_at(token, now)?)
    }

    /// Re-resolve the full user record behind an authenticated subject
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete refresh tokens that have already expired
    pub async fn cleanup_expired_refresh_tokens(&self) -> Result<u64, AuthError> {
        self.refresh.sweep_expired(Utc::now()).await
    }

    /// Check that the credential store is reachable
    pub async fn check_store(&self) -> Result<(), AuthError> {
        Ok(self.store.ping().await?)
    }

    /// Token codec (for the auth gate)
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn refresh_manager(&self) -> &RefreshTokenManager {
        &self.refresh
    }

    async fn issue_session(
        &self,
        user: User,
        mode: &IssuanceMode,
        device_info: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthTokensResponse, AuthError> {
        let lifetimes = mode.lifetimes();

        let access_token = self.codec.issue_access_at(
            &user.id.to_string(),
            &user.email,
            lifetimes.access_ttl,
            now,
        )?;
        let refresh_token = self
            .refresh
            .issue_for_mode(user.id, mode, device_info, now)
            .await?;

        Ok(AuthTokensResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: lifetimes.access_ttl.num_seconds(),
            user: user.into(),
        })
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use chrono::Duration;

    const SECRET: &str = "auth-service-test-secret-32-bytes-long";

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryCredentialStore::new()), SECRET)
    }

    fn register_request(source: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: "u1@example.com".to_string(),
            password: "5e884898da28047151d0e56f8dc62927".to_string(),
            name: "U One".to_string(),
            source: source.map(str::to_string),
            device_info: None,
        }
    }

    fn login_request(password: &str, source: Option<&str>) -> LoginRequest {
        LoginRequest {
            email: "u1@example.com".to_string(),
            password: password.to_string(),
            source: source.map(str::to_string),
            device_info: None,
        }
    }

    #[tokio::test]
    async fn test_register_without_source_uses_legacy_lifetimes() {
        let service = service();
        let now = Utc::now();
        let tokens = service.register_at(&register_request(None), now).await.unwrap();

        assert_eq!(tokens.expires_in, Duration::hours(24).num_seconds());
        let claims = service.verify_access_at(&tokens.access_token, now).unwrap();
        assert_eq!(claims.exp, (now + Duration::hours(24)).timestamp());
        assert_eq!(claims.sub, tokens.user.id.to_string());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = service();
        service.register(&register_request(None)).await.unwrap();

        let err = service.register(&register_request(None)).await.unwrap_err();
        assert_eq!(err, AuthError::UserAlreadyExists);
    }

    #[tokio::test]
    async fn test_login_with_source() {
        let service = service();
        let registered = service.register(&register_request(None)).await.unwrap();

        let now = Utc::now();
        let password = "5e884898da28047151d0e56f8dc62927";
        let tokens = service
            .login_at(&login_request(password, Some("extension")), now)
            .await
            .unwrap();

        assert_eq!(tokens.user, registered.user);
        assert_eq!(tokens.expires_in, 3600);
        let claims = service.verify_access_at(&tokens.access_token, now).unwrap();
        assert_eq!(claims.exp, (now + Duration::hours(1)).timestamp());
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_email() {
        let service = service();
        service.register(&register_request(None)).await.unwrap();

        let err = service
            .login(&login_request("wrong", Some("web")))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let unknown = LoginRequest {
            email: "nobody@example.com".to_string(),
            ..login_request("5e884898da28047151d0e56f8dc62927", None)
        };
        assert_eq!(
            service.login(&unknown).await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_current_user() {
        let service = service();
        let tokens = service.register(&register_request(None)).await.unwrap();

        let user = service.current_user(tokens.user.id).await.unwrap();
        assert_eq!(user.email, "u1@example.com");

        assert_eq!(
            service.current_user(Uuid::new_v4()).await.unwrap_err(),
            AuthError::UserNotFound
        );
    }

    struct AlwaysMatch;

    impl CredentialMatcher for AlwaysMatch {
        fn matches(&self, _stored: &str, _presented: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_custom_matcher() {
        let service = service().with_matcher(Arc::new(AlwaysMatch));
        service.register(&register_request(None)).await.unwrap();

        assert!(service
            .login(&login_request("anything", None))
            .await
            .is_ok());
    }
}
