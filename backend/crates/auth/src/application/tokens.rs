//! Token Service
//!
//! Builds and verifies the three token families: access, refresh, and
//! image-access. Access and refresh are signed with independent secrets so
//! compromise of one does not compromise the other; image tokens ride the
//! access secret with their own claim shape and a short TTL.

use chrono::Utc;
use platform::token::TokenSigner;
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::account::Account;
use crate::domain::value_object::account_id::{AccountId, ImageId};
use crate::domain::value_object::account_role::AccountRole;
use crate::error::{AuthError, AuthResult};

/// Claims carried by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Internal account UUID
    pub sub: String,
    /// Public account id (for handlers that never need the UUID)
    pub pid: String,
    /// Role code
    pub role: String,
    /// Account token version at issue time
    pub ver: i32,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl SessionClaims {
    /// Parse the subject back into an `AccountId`
    pub fn account_id(&self) -> AuthResult<AccountId> {
        self.sub
            .parse::<uuid::Uuid>()
            .map(AccountId::from_uuid)
            .map_err(|_| AuthError::SessionInvalid)
    }

    /// Parse the role code
    pub fn account_role(&self) -> AuthResult<AccountRole> {
        AccountRole::from_code(&self.role).map_err(|_| AuthError::SessionInvalid)
    }
}

/// Claims carried by image-access tokens
///
/// Binds account and image so a token minted for one image stops working
/// when the image is replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageClaims {
    /// Internal account UUID
    pub sub: String,
    /// Image UUID the token grants access to
    pub img: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token issue/verify service
pub struct TokenService {
    access: TokenSigner,
    refresh: TokenSigner,
    issuer: String,
    audience: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    image_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: TokenSigner::new(&config.access_secret, &config.issuer, &config.audience),
            refresh: TokenSigner::new(&config.refresh_secret, &config.issuer, &config.audience),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl_secs: config.access_ttl.as_secs() as i64,
            refresh_ttl_secs: config.refresh_ttl.as_secs() as i64,
            image_ttl_secs: config.image_token_ttl.as_secs() as i64,
        }
    }

    fn session_claims(&self, account: &Account, token_version: i32, ttl_secs: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: account.account_id.to_string(),
            pid: account.public_id.to_string(),
            role: account.role.code().to_string(),
            ver: token_version,
            iat: now,
            exp: now + ttl_secs,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        }
    }

    /// Issue an access/refresh pair carrying `token_version`
    pub fn issue_pair(&self, account: &Account, token_version: i32) -> AuthResult<TokenPair> {
        let access = self
            .access
            .sign(&self.session_claims(account, token_version, self.access_ttl_secs))?;
        let refresh = self
            .refresh
            .sign(&self.session_claims(account, token_version, self.refresh_ttl_secs))?;

        Ok(TokenPair { access, refresh })
    }

    /// Verify an access token; all failures collapse to `SessionInvalid`
    pub fn verify_access(&self, token: &str) -> AuthResult<SessionClaims> {
        Ok(self.access.verify(token)?)
    }

    /// Verify a refresh token; all failures collapse to `SessionInvalid`
    pub fn verify_refresh(&self, token: &str) -> AuthResult<SessionClaims> {
        Ok(self.refresh.verify(token)?)
    }

    /// Issue a short-lived image-access token bound to account + image
    pub fn issue_image_token(&self, account: &Account, image_id: &ImageId) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = ImageClaims {
            sub: account.account_id.to_string(),
            img: image_id.to_string(),
            iat: now,
            exp: now + self.image_ttl_secs,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        Ok(self.access.sign(&claims)?)
    }

    /// Verify an image-access token
    pub fn verify_image_token(&self, token: &str) -> AuthResult<ImageClaims> {
        Ok(self.access.verify(token)?)
    }

    /// Image-access token TTL in seconds (for response metadata)
    pub fn image_token_ttl_secs(&self) -> i64 {
        self.image_ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::account_password::{AccountPassword, RawPassword};
    use crate::domain::value_object::email::Email;

    fn account() -> Account {
        let raw = RawPassword::new("p@ssw0rd1".to_string()).unwrap();
        let hash = AccountPassword::from_raw(&raw, None).unwrap();
        Account::new(Some(Email::new("a@x.com").unwrap()), None, hash).unwrap()
    }

    fn service() -> TokenService {
        TokenService::new(&AuthConfig::with_random_secrets())
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let service = service();
        let account = account();
        let pair = service.issue_pair(&account, 3).unwrap();

        let access = service.verify_access(&pair.access).unwrap();
        assert_eq!(access.sub, account.account_id.to_string());
        assert_eq!(access.pid, account.public_id.to_string());
        assert_eq!(access.role, "user");
        assert_eq!(access.ver, 3);
        assert_eq!(access.account_id().unwrap(), account.account_id);

        let refresh = service.verify_refresh(&pair.refresh).unwrap();
        assert_eq!(refresh.ver, 3);
    }

    #[test]
    fn test_access_and_refresh_secrets_are_independent() {
        let service = service();
        let pair = service.issue_pair(&account(), 0).unwrap();

        // Tokens do not validate across families
        assert!(service.verify_access(&pair.refresh).is_err());
        assert!(service.verify_refresh(&pair.access).is_err());
    }

    #[test]
    fn test_image_token_roundtrip() {
        let service = service();
        let account = account();
        let image_id = ImageId::new();

        let token = service.issue_image_token(&account, &image_id).unwrap();
        let claims = service.verify_image_token(&token).unwrap();
        assert_eq!(claims.sub, account.account_id.to_string());
        assert_eq!(claims.img, image_id.to_string());
    }

    #[test]
    fn test_image_token_is_not_an_access_token() {
        let service = service();
        let token = service
            .issue_image_token(&account(), &ImageId::new())
            .unwrap();
        // Claim shapes differ, so the families do not cross-validate
        assert!(service.verify_access(&token).is_err());
    }

    #[test]
    fn test_garbage_tokens_rejected() {
        let service = service();
        assert!(matches!(
            service.verify_access("garbage"),
            Err(AuthError::SessionInvalid)
        ));
        assert!(matches!(
            service.verify_refresh(""),
            Err(AuthError::SessionInvalid)
        ));
    }
}
