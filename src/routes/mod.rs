//! Route definitions

mod auth;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::{request_tracing, security_headers};
use crate::state::AppState;

pub use auth::auth_routes;

/// Prefix for all versioned API routes
pub const API_PREFIX: &str = "/api/v1";

/// Build the complete application router
pub fn app_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(API_PREFIX, auth_routes(state.clone()))
        .with_state(state)
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_tracing))
        .layer(cors)
}

/// CORS for the configured origins. An empty list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %s, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("No CORS origins configured, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
