//! API DTOs (Data Transfer Objects)
//!
//! `AccountResponse` is the sanitized projection: no password hash, no
//! token version, no internal UUID.

use serde::{Deserialize, Serialize};

use crate::domain::entity::account::Account;

// ============================================================================
// Register
// ============================================================================

/// Register request (at least one of email/phone)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

// ============================================================================
// Login
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email or phone
    pub identifier: String,
    pub password: String,
    /// TOTP or backup code (required when MFA is enabled)
    pub mfa_code: Option<String>,
}

// ============================================================================
// Account projection
// ============================================================================

/// Sanitized account response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub public_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub mfa_enabled: bool,
    pub last_login_at_ms: Option<i64>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            public_id: account.public_id.to_string(),
            email: account.email.as_ref().map(|e| e.as_str().to_string()),
            phone: account.phone.as_ref().map(|p| p.as_str().to_string()),
            role: account.role.code().to_string(),
            mfa_enabled: account.mfa_enabled,
            last_login_at_ms: account.last_login_at.map(|t| t.timestamp_millis()),
        }
    }
}

// ============================================================================
// MFA
// ============================================================================

/// MFA setup response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaSetupResponse {
    /// Base32 secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
    /// QR code as base64-encoded PNG
    pub qr_code: String,
}

/// MFA verify request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaVerifyRequest {
    pub code: String,
}

/// MFA verify response
///
/// Backup codes appear here once and are never recoverable afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaVerifyResponse {
    pub backup_codes: Vec<String>,
}

// ============================================================================
// CSRF
// ============================================================================

/// CSRF token response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

// ============================================================================
// Profile image
// ============================================================================

/// Image stored response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStoredResponse {
    pub image_id: String,
}

/// Minted image URL response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrlResponse {
    pub url: String,
    pub expires_in_secs: i64,
}

/// Query string for the token-authorized image route
#[derive(Debug, Clone, Deserialize)]
pub struct ImageTokenQuery {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::account_password::{AccountPassword, RawPassword};
    use crate::domain::value_object::email::Email;

    #[test]
    fn test_account_response_is_sanitized() {
        let raw = RawPassword::new("p@ssw0rd1".to_string()).unwrap();
        let hash = AccountPassword::from_raw(&raw, None).unwrap();
        let account = Account::new(Some(Email::new("a@x.com").unwrap()), None, hash).unwrap();

        let json = serde_json::to_string(&AccountResponse::from(&account)).unwrap();

        assert!(json.contains("\"email\":\"a@x.com\""));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.to_lowercase().contains("password"));
        assert!(!json.contains("tokenVersion"));
        assert!(!json.contains(&account.account_id.to_string()));
    }
}
