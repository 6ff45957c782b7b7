//! HTTP middleware
//!
//! Request tracing, security headers and the bearer token gate.

pub mod auth;
mod security;
mod tracing;

pub use auth::{authorize, bearer_token, require_auth, AuthenticatedUser};
pub use security::{hsts_header, security_headers};
pub use self::tracing::{request_tracing, REQUEST_ID_HEADER};
