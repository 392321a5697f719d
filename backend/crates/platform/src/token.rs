//! Signed Claim Tokens
//!
//! Thin wrapper over HS256 JWTs. Claim shapes are owned by the caller; this
//! module only guarantees the verification contract: signature, expiry,
//! issuer, and audience are all checked, and every failure collapses into a
//! single [`TokenError::Invalid`] so callers treat a missing token and a bad
//! token identically.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Missing, malformed, expired, tampered, or otherwise unusable.
    /// Deliberately undifferentiated.
    #[error("token is invalid")]
    Invalid,

    /// Signing failed (server-side fault)
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signer/verifier for one token family (one secret, one issuer/audience)
///
/// Access and refresh tokens each get their own `TokenSigner` with an
/// independent secret, so compromise of one does not compromise the other.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &[u8], issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a claims value
    ///
    /// The caller is responsible for including `exp`, `iss`, and `aud`
    /// claims matching this signer's validation settings.
    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and deserialize its claims
    ///
    /// Checks signature, `exp` (with the library's default leeway), `iss`,
    /// and `aud`. Never panics or leaks the failure cause.
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        decode::<C>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(Debug, Serialize, Deserialize)]
    struct TestClaims {
        sub: String,
        ver: i32,
        iat: i64,
        exp: i64,
        iss: String,
        aud: String,
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn claims_with_exp(exp: i64) -> TestClaims {
        TestClaims {
            sub: "account-1".to_string(),
            ver: 0,
            iat: now(),
            exp,
            iss: "issuer".to_string(),
            aud: "audience".to_string(),
        }
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let signer = TokenSigner::new(b"test-secret", "issuer", "audience");
        let token = signer.sign(&claims_with_exp(now() + 900)).unwrap();

        let claims: TestClaims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "account-1");
        assert_eq!(claims.ver, 0);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new(b"test-secret", "issuer", "audience");
        // Well past the default leeway
        let token = signer.sign(&claims_with_exp(now() - 3600)).unwrap();

        let result = signer.verify::<TestClaims>(&token);
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = TokenSigner::new(b"secret-a", "issuer", "audience");
        let other = TokenSigner::new(b"secret-b", "issuer", "audience");

        let token = signer.sign(&claims_with_exp(now() + 900)).unwrap();
        assert!(matches!(
            other.verify::<TestClaims>(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let signer = TokenSigner::new(b"test-secret", "issuer", "audience");
        let other = TokenSigner::new(b"test-secret", "issuer", "other-audience");

        let token = signer.sign(&claims_with_exp(now() + 900)).unwrap();
        assert!(matches!(
            other.verify::<TestClaims>(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let signer = TokenSigner::new(b"test-secret", "issuer", "audience");
        let other = TokenSigner::new(b"test-secret", "other-issuer", "audience");

        let token = signer.sign(&claims_with_exp(now() + 900)).unwrap();
        assert!(matches!(
            other.verify::<TestClaims>(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = TokenSigner::new(b"test-secret", "issuer", "audience");
        assert!(matches!(
            signer.verify::<TestClaims>("not.a.token"),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            signer.verify::<TestClaims>(""),
            Err(TokenError::Invalid)
        ));
    }
}
