//! Password Hashing and Verification
//!
//! NIST SP 800-63B compliant password handling with:
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of sensitive data
//! - Constant-time comparison
//! - Optional HIBP (Have I Been Pwned) breach checking
//!
//! The same Argon2id path is exposed for other short secrets that must be
//! stored verifiable-but-not-recoverable (MFA backup codes) via
//! [`hash_opaque`] / [`verify_opaque`].

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use sha1::{Digest, Sha1};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants (NIST SP 800-63B compliant)
// ============================================================================

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// HIBP API endpoint (k-Anonymity model)
const HIBP_API_URL: &str = "https://api.pwnedpasswords.com/range/";

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password contains only whitespace
    #[error("Password cannot be empty or contain only whitespace")]
    Blank,

    /// Password contains invalid characters (control characters)
    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed - fatal to the calling flow
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,

    /// HIBP API check failed (non-fatal, logged)
    #[error("Breach check failed: {0}")]
    BreachCheckFailed(String),
}

// ============================================================================
// Plain Password (Zeroized on drop)
// ============================================================================

/// Plaintext password with automatic memory zeroization
///
/// The plaintext is erased from memory when the value is dropped, is never
/// `Clone`, and Debug output is redacted. Nothing in this module logs or
/// stores the plaintext.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PlainPassword(String);

impl PlainPassword {
    /// Create a new plaintext password with policy validation
    ///
    /// Unicode is normalized with NFKC before validation; length is counted
    /// in code points (not bytes) per NIST SP 800-63B.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::Blank);
        }

        let char_count = normalized.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        // Control characters other than space/tab are rejected
        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != ' ' && ch != '\t')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(Self(normalized))
    }

    /// Create without validation (for testing or trusted input)
    #[cfg(test)]
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    /// Get the password as bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the password using Argon2id
    ///
    /// ## Arguments
    /// * `pepper` - Optional application-wide secret appended before hashing
    ///
    /// ## Returns
    /// PHC-formatted hash string wrapped in [`HashedPassword`]
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let phc = hash_opaque_peppered(self.as_bytes(), pepper)?;
        Ok(HashedPassword { hash: phc })
    }

    /// Check if password has been compromised using the HIBP API
    ///
    /// Uses the k-Anonymity model: only the first 5 hex characters of the
    /// SHA-1 hash leave the process.
    ///
    /// ## Returns
    /// - `Ok(true)` if the password appears in known breaches
    /// - `Ok(false)` if not found
    /// - `Err(_)` if the API check failed (treat as non-blocking)
    pub async fn check_breach(&self) -> Result<bool, PasswordHashError> {
        let mut hasher = Sha1::new();
        hasher.update(self.as_bytes());
        let digest = hasher.finalize();

        let hash_hex: String = digest.iter().map(|b| format!("{:02X}", b)).collect();
        let prefix = &hash_hex[..5];
        let suffix = &hash_hex[5..];

        let url = format!("{}{}", HIBP_API_URL, prefix);
        let response = reqwest::get(&url)
            .await
            .map_err(|e| PasswordHashError::BreachCheckFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PasswordHashError::BreachCheckFailed(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PasswordHashError::BreachCheckFailed(e.to_string()))?;

        // Response lines: SUFFIX:COUNT
        let compromised = body.lines().any(|line| {
            line.split_once(':')
                .is_some_and(|(s, _)| s.eq_ignore_ascii_case(suffix))
        });

        Ok(compromised)
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlainPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// The PHC string carries the algorithm, version, parameters, salt, and
/// digest, so verification is self-describing.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        // Validate it's a valid PHC string
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash
    ///
    /// ## Arguments
    /// * `password` - The plaintext password to verify
    /// * `pepper` - Must match the pepper used during hashing
    pub fn verify(&self, password: &PlainPassword, pepper: Option<&[u8]>) -> bool {
        verify_opaque_peppered(password.as_bytes(), pepper, &self.hash)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Opaque secret hashing (backup codes and similar short secrets)
// ============================================================================

/// Hash an opaque secret with Argon2id, returning the PHC string
///
/// Same parameters as password hashing, so stored secrets are never
/// comparable plaintext.
pub fn hash_opaque(secret: &[u8]) -> Result<String, PasswordHashError> {
    hash_opaque_peppered(secret, None)
}

/// Verify an opaque secret against a PHC string
///
/// Returns `false` on any mismatch or malformed hash.
pub fn verify_opaque(secret: &[u8], phc: &str) -> bool {
    verify_opaque_peppered(secret, None, phc)
}

fn hash_opaque_peppered(
    secret: &[u8],
    pepper: Option<&[u8]>,
) -> Result<String, PasswordHashError> {
    let input = match pepper {
        Some(p) => {
            let mut combined = secret.to_vec();
            combined.extend_from_slice(p);
            combined
        }
        None => secret.to_vec(),
    };

    // Random 128-bit salt per hash
    let salt = SaltString::generate(OsRng);

    // OWASP recommended Argon2id parameters: m=19456 (19 MiB), t=2, p=1
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(&input, &salt)
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

    Ok(hash.to_string())
}

fn verify_opaque_peppered(secret: &[u8], pepper: Option<&[u8]>, phc: &str) -> bool {
    let input = match pepper {
        Some(p) => {
            let mut combined = secret.to_vec();
            combined.extend_from_slice(p);
            combined
        }
        None => secret.to_vec(),
    };

    let parsed_hash = match PasswordHash::new(phc) {
        Ok(h) => h,
        Err(_) => return false,
    };

    // Argon2 uses constant-time comparison internally
    Argon2::default().verify_password(&input, &parsed_hash).is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_too_short() {
        let result = PlainPassword::new("short".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::TooShort { .. })));
    }

    #[test]
    fn test_password_too_long() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        let result = PlainPassword::new(long_password);
        assert!(matches!(result, Err(PasswordPolicyError::TooLong { .. })));
    }

    #[test]
    fn test_password_blank() {
        assert!(matches!(
            PlainPassword::new("".to_string()),
            Err(PasswordPolicyError::Blank)
        ));
        assert!(matches!(
            PlainPassword::new("        ".to_string()),
            Err(PasswordPolicyError::Blank)
        ));
    }

    #[test]
    fn test_password_control_characters() {
        let result = PlainPassword::new("pass\u{0000}word".to_string());
        assert!(matches!(
            result,
            Err(PasswordPolicyError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_valid_password() {
        assert!(PlainPassword::new("p@ssw0rd1".to_string()).is_ok());
    }

    #[test]
    fn test_unicode_password() {
        let result = PlainPassword::new("パスワード安全です!".to_string());
        assert!(result.is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = PlainPassword::new_unchecked("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        assert!(hashed.verify(&password, None));

        let wrong_password = PlainPassword::new_unchecked("WrongPassword123!".to_string());
        assert!(!hashed.verify(&wrong_password, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = PlainPassword::new_unchecked("TestPassword123!".to_string());
        let pepper = b"application_pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let password = PlainPassword::new_unchecked("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        let phc_string = hashed.as_phc_string().to_string();
        let restored = HashedPassword::from_phc_string(phc_string).unwrap();

        assert!(restored.verify(&password, None));
    }

    #[test]
    fn test_invalid_phc_string() {
        let result = HashedPassword::from_phc_string("not_a_valid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_opaque_hash_and_verify() {
        let phc = hash_opaque(b"a1b2c-3d4e5").unwrap();
        assert!(verify_opaque(b"a1b2c-3d4e5", &phc));
        assert!(!verify_opaque(b"a1b2c-3d4e6", &phc));
        assert!(!verify_opaque(b"a1b2c-3d4e5", "garbage"));
    }

    #[test]
    fn test_debug_redaction() {
        let password = PlainPassword::new_unchecked("secret".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
