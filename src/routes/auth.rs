//! Authentication routes

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::handlers::auth;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Create authentication routes
///
/// Token-bearing responses are marked `no-store`. `/auth/me` sits behind
/// the bearer token gate.
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route_layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let protected = Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}
