//! Authentication middleware
//!
//! Verifies the bearer access token on protected routes and attaches the
//! authenticated subject to the request. The gate never touches the
//! credential store.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService, TokenCodec};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated subject extracted from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Token subject, carried as issued
    pub user_id: String,
    pub email: String,
}

impl AuthenticatedUser {
    /// Subject as a store user ID. Subjects that are not UUIDs name no stored user.
    pub fn user_uuid(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.user_id).map_err(|_| AuthError::UserNotFound)
    }
}

/// Extract the token from an exact `Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingAuthorization)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Run the full gate against a raw header value
pub fn authorize(codec: &TokenCodec, header: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(header)?;
    let claims = codec.verify_access(token)?;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
    })
}

fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()
}

/// Middleware guarding a group of routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = authorization_header(request.headers())?;

    let user = authorize(state.auth_service.codec(), header).map_err(|e| {
        tracing::debug!(code = e.code(), "Request rejected by auth gate");
        e
    })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extractor for authenticated users
///
/// Reuses the subject attached by [`require_auth`] when the route is behind
/// it, otherwise verifies the Authorization header itself.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let auth_service = Arc::<AuthService>::from_ref(state);
        let header = authorization_header(&parts.headers)?;
        let user = authorize(auth_service.codec(), header)?;

        parts.extensions.insert(user.clone());

        Ok(user)
    }
}
