//! Auth (Credential & Session Security) Module
//!
//! Clean Architecture structure:
//! - `domain/` - Account entity, value objects, repository traits
//! - `application/` - Use cases and token plumbing
//! - `infra/` - Postgres and in-memory repository implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration and login with email or phone + password
//! - Stateless access/refresh token pair in path-scoped cookies
//! - Revocation via a per-account token version (logout everywhere,
//!   single-use refresh tokens)
//! - TOTP-based MFA with single-use backup codes
//! - CSRF double-submit guard for unsafe methods
//! - Login throttling per identifier+origin
//! - Profile images encrypted at rest (AES-256-GCM)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Independent secrets for access and refresh tokens
//! - Refresh tokens valid only while their embedded version matches the
//!   account's current `token_version`
//! - Credential, MFA, and token failures are indistinguishable to callers

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::tokens::TokenService;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAccountRepository;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
