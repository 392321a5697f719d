//! TOTP Secret Value Object
//!
//! Shared secret for time-based one-time codes. Google Authenticator
//! compatible settings; verification tolerates ±1 time step for clock skew.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use totp_rs::{Algorithm, Secret, TOTP};

/// TOTP configuration constants
const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
/// Allowed steps before/after the current one
const TOTP_SKEW: u8 = 1;
const TOTP_ISSUER: &str = "ordergate";

/// TOTP Secret for two-factor authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpSecret {
    /// Base32-encoded secret
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random TOTP secret
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from database)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_str = secret.into();
        // Validate by trying to decode
        Secret::Encoded(secret_str.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(Self {
            secret_base32: secret_str,
        })
    }

    /// Get the base32-encoded secret for storage
    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    /// Create a TOTP instance for this secret
    fn to_totp(&self, account_name: &str) -> AppResult<TOTP> {
        let secret = Secret::Encoded(self.secret_base32.clone());

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            secret
                .to_bytes()
                .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {}", e)))?,
            Some(TOTP_ISSUER.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Verify a TOTP code against the current time
    pub fn verify(&self, code: &str, account_name: &str) -> AppResult<bool> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    /// Verify a TOTP code against a fixed timestamp (for skew tests)
    #[cfg(test)]
    pub fn verify_at(&self, code: &str, account_name: &str, time: u64) -> AppResult<bool> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.check(code, time))
    }

    /// Generate the code for a fixed timestamp (for tests)
    #[cfg(test)]
    pub fn generate_at(&self, account_name: &str, time: u64) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.generate(time))
    }

    /// Generate current TOTP code (for tests)
    #[cfg(test)]
    pub fn generate_current(&self, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        totp.generate_current()
            .map_err(|e| AppError::internal(format!("Failed to generate TOTP: {}", e)))
    }

    /// Generate a QR code as base64-encoded PNG
    pub fn generate_qr_code(&self, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        totp.get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))
    }

    /// Get the otpauth:// URL for manual entry
    pub fn get_otpauth_url(&self, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(account_name)?;
        Ok(totp.get_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "a@x.com";

    #[test]
    fn test_totp_secret_generate() {
        let secret = TotpSecret::generate();
        assert!(!secret.as_base32().is_empty());
    }

    #[test]
    fn test_totp_verify_current() {
        let secret = TotpSecret::generate();

        let code = secret.generate_current(ACCOUNT).unwrap();
        assert!(secret.verify(&code, ACCOUNT).unwrap());
        assert!(!secret.verify("000000", ACCOUNT).unwrap());
    }

    #[test]
    fn test_totp_skew_window() {
        let secret = TotpSecret::generate();
        let base: u64 = 1_700_000_010;

        let code = secret.generate_at(ACCOUNT, base).unwrap();

        // Within ±1 step: accepted
        assert!(secret.verify_at(&code, ACCOUNT, base).unwrap());
        assert!(secret.verify_at(&code, ACCOUNT, base + 30).unwrap());
        assert!(secret.verify_at(&code, ACCOUNT, base - 30).unwrap());

        // 3 steps away: rejected
        assert!(!secret.verify_at(&code, ACCOUNT, base + 90).unwrap());
    }

    #[test]
    fn test_totp_secret_from_base32() {
        let secret = TotpSecret::generate();
        let base32 = secret.as_base32().to_string();

        let restored = TotpSecret::from_base32(base32).unwrap();
        assert_eq!(secret.as_base32(), restored.as_base32());
    }

    #[test]
    fn test_otpauth_url_contains_issuer() {
        let secret = TotpSecret::generate();
        let url = secret.get_otpauth_url(ACCOUNT).unwrap();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("ordergate"));
    }
}
