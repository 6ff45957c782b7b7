//! Authentication HTTP handlers
//!
//! Endpoints for email/password authentication and token refresh.

use axum::{extract::State, Json};
use validator::Validate;

use super::AuthenticatedUser;
use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ApiResponse, AuthTokensResponse, LoginRequest, LogoutRequest, RefreshTokenRequest,
    RegisterRequest, UserResponse,
};
use crate::state::AppState;

/// POST /auth/register - Create an account and issue the first token pair
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    req.validate()?;

    let tokens = state.auth_service.register(&req).await?;

    Ok(Json(ApiResponse::ok("User registered successfully", tokens)))
}

/// POST /auth/login - Authenticate with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    req.validate()?;

    let tokens = state.auth_service.login(&req).await?;

    Ok(Json(ApiResponse::ok("Login successful", tokens)))
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<Json<ApiResponse<AuthTokensResponse>>> {
    req.validate()?;

    let tokens = state
        .auth_service
        .refresh_tokens(&req.refresh_token, req.source.as_deref())
        .await
        .map_err(|e| {
            if e == AuthError::UserNotFound {
                tracing::warn!("Refresh token presented for a user that no longer exists");
            }
            ApiError::from_refresh(e)
        })?;

    Ok(Json(ApiResponse::ok("Token refreshed successfully", tokens)))
}

/// POST /auth/logout - Revoke a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    req.validate()?;

    state.auth_service.logout(&req.refresh_token).await?;

    Ok(Json(ApiResponse::message("Logged out successfully")))
}

/// GET /auth/me - Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let user = state.auth_service.current_user(user.user_uuid()?).await?;

    Ok(Json(ApiResponse::ok("User retrieved", user.into())))
}
