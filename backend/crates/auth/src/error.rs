//! Auth Error Types
//!
//! Auth-specific error variants that map into the closed
//! `kernel::error::ErrorKind` set exactly once, in [`AuthError::kind`].
//! Transport status codes are derived from the kind, never per call site.
//!
//! Credential, MFA, and token failures share one generic client message so
//! the response does not distinguish "no such account", "wrong password",
//! and "bad code" (account enumeration). Server-side logging keeps the
//! distinction.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Generic message for every credential-shaped failure
const CREDENTIALS_MESSAGE: &str = "Email/phone or password incorrect";

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed schema/format validation
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown identifier or wrong password
    #[error("{CREDENTIALS_MESSAGE}")]
    InvalidCredentials,

    /// MFA enabled but no code submitted
    #[error("{CREDENTIALS_MESSAGE}")]
    MfaCodeMissing,

    /// MFA code did not verify (TOTP or backup)
    #[error("{CREDENTIALS_MESSAGE}")]
    InvalidMfaCode,

    /// MFA setup requested while already enabled
    #[error("Two-factor authentication is already enabled")]
    MfaAlreadyEnabled,

    /// MFA verify without a prior setup
    #[error("Two-factor authentication setup has not been started")]
    MfaNotConfigured,

    /// Email or phone already registered
    #[error("Email or phone is already registered")]
    IdentifierTaken,

    /// Account does not exist
    #[error("Account not found")]
    AccountNotFound,

    /// Login throttle exceeded
    #[error("Too many failed attempts, try again later")]
    RateLimited,

    /// Missing, invalid, or expired session token.
    /// Expiry and malformation are deliberately indistinguishable.
    #[error("Not authenticated")]
    SessionInvalid,

    /// Authenticated but not allowed
    #[error("Not allowed")]
    Forbidden,

    /// No profile image stored for the account
    #[error("Profile image not found")]
    ImageNotFound,

    /// Stored image failed authenticated decryption
    #[error("Profile image could not be read")]
    ImageUnreadable,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Map this error into the closed kind set (the single mapping point)
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidInput(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::MfaCodeMissing
            | AuthError::InvalidMfaCode
            | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::AccountNotFound | AuthError::ImageNotFound => ErrorKind::NotFound,
            AuthError::MfaAlreadyEnabled | AuthError::IdentifierTaken => ErrorKind::Conflict,
            AuthError::MfaNotConfigured => ErrorKind::BadRequest,
            AuthError::RateLimited => ErrorKind::TooManyRequests,
            AuthError::ImageUnreadable | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError for the transport layer
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::ImageUnreadable => err.with_action("Please upload the image again"),
            AuthError::RateLimited => err.with_action("Wait before retrying"),
            _ => err,
        }
    }

    /// Log the error with the appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ImageUnreadable => {
                tracing::error!("Stored profile image failed authenticated decryption");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::MfaCodeMissing | AuthError::InvalidMfaCode => {
                tracing::warn!("MFA challenge failed");
            }
            AuthError::RateLimited => {
                tracing::warn!("Login attempt rejected by throttle");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::InvalidInput(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<platform::token::TokenError> for AuthError {
    fn from(err: platform::token::TokenError) -> Self {
        match err {
            platform::token::TokenError::Invalid => AuthError::SessionInvalid,
            platform::token::TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<platform::cipher::CipherError> for AuthError {
    fn from(err: platform::cipher::CipherError) -> Self {
        match err {
            platform::cipher::CipherError::DecryptFailed => AuthError::ImageUnreadable,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            AuthError::MfaCodeMissing.to_string()
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            AuthError::InvalidMfaCode.to_string()
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::SessionInvalid.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::IdentifierTaken.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::RateLimited.kind(), ErrorKind::TooManyRequests);
        assert_eq!(AuthError::ImageUnreadable.kind(), ErrorKind::InternalServerError);
        assert_eq!(
            AuthError::InvalidInput("bad".into()).kind(),
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn test_token_error_conversion() {
        let err: AuthError = platform::token::TokenError::Invalid.into();
        assert!(matches!(err, AuthError::SessionInvalid));
    }

    #[test]
    fn test_cipher_error_conversion() {
        let err: AuthError = platform::cipher::CipherError::DecryptFailed.into();
        assert!(matches!(err, AuthError::ImageUnreadable));
    }
}
