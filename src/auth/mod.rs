//! Authentication module
//!
//! Token issuance, verification and rotation.
//! - Stateless HS256 access tokens
//! - Opaque, single-use refresh tokens with per-source lifetimes
//! - Pluggable comparison of client-hashed credentials

mod credentials;
mod error;
mod jwt;
pub mod policy;
mod refresh;
mod service;

pub use credentials::{constant_time_eq, CredentialMatcher, ExactMatch};
pub use error::AuthError;
pub use jwt::{Claims, JwtError, TokenCodec};
pub use policy::{lifetimes, IssuanceMode, Lifetimes};
pub use refresh::{RefreshTokenManager, RotatedSession};
pub use service::AuthService;
