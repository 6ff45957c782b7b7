//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::store::CredentialStore;

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }

    /// Build the state directly from a store and signing secret
    pub fn from_store(store: Arc<dyn CredentialStore>, jwt_secret: &str) -> Self {
        Self::new(Arc::new(AuthService::new(store, jwt_secret)))
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
