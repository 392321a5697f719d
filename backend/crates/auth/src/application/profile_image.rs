//! Profile Image Use Case
//!
//! Binary secrets pass through the authenticated cipher before storage and
//! after retrieval. Serving works two ways: the owner over the session
//! cookie, or anyone holding a short-lived image-access token (cookie-less
//! embedding, e.g. an <img> URL).

use std::sync::Arc;

use platform::cipher::BlobCipher;

use crate::application::config::AuthConfig;
use crate::application::tokens::TokenService;
use crate::domain::entity::profile_image::ProfileImage;
use crate::domain::repository::{AccountRepository, ProfileImageRepository};
use crate::domain::value_object::account_id::{AccountId, ImageId};
use crate::domain::value_object::public_id::PublicId;
use crate::error::{AuthError, AuthResult};

/// Upload size cap (decrypted bytes)
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Decrypted image ready to serve
pub struct ServedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Minted image URL
pub struct ImageUrlOutput {
    pub url: String,
    pub expires_in_secs: i64,
}

/// Profile image use case
pub struct ProfileImageUseCase<R>
where
    R: AccountRepository + ProfileImageRepository,
{
    repo: Arc<R>,
    cipher: Arc<BlobCipher>,
    tokens: Arc<TokenService>,
    config: Arc<AuthConfig>,
}

impl<R> ProfileImageUseCase<R>
where
    R: AccountRepository + ProfileImageRepository,
{
    pub fn new(
        repo: Arc<R>,
        cipher: Arc<BlobCipher>,
        tokens: Arc<TokenService>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            repo,
            cipher,
            tokens,
            config,
        }
    }

    /// Encrypt and store the caller's profile image, replacing any previous
    /// one. Returns the fresh image id.
    pub async fn store(
        &self,
        account_id: &AccountId,
        bytes: &[u8],
        mime_type: &str,
    ) -> AuthResult<ImageId> {
        if bytes.is_empty() {
            return Err(AuthError::InvalidInput("Image body is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AuthError::InvalidInput(format!(
                "Image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }
        if !mime_type.starts_with("image/") {
            return Err(AuthError::InvalidInput(
                "Content type must be an image".to_string(),
            ));
        }

        let blob = self
            .cipher
            .encrypt(bytes)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let image = ProfileImage::new(*account_id, blob, mime_type.to_string());
        self.repo.upsert(&image).await?;

        tracing::info!(
            account_id = %account_id,
            image_id = %image.image_id,
            size = bytes.len(),
            "Profile image stored"
        );

        Ok(image.image_id)
    }

    /// Serve the caller's own image (session-cookie path)
    pub async fn serve_own(&self, account_id: &AccountId) -> AuthResult<ServedImage> {
        let image = self
            .load_image(account_id)
            .await?
            .ok_or(AuthError::ImageNotFound)?;
        self.decrypt(image)
    }

    /// Mint a short-lived URL for the caller's image
    pub async fn mint_url(
        &self,
        account_id: &AccountId,
        public_id: &PublicId,
    ) -> AuthResult<ImageUrlOutput> {
        let account = self
            .repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        let image = self
            .load_image(account_id)
            .await?
            .ok_or(AuthError::ImageNotFound)?;

        let token = self.tokens.issue_image_token(&account, &image.image_id)?;

        Ok(ImageUrlOutput {
            url: format!(
                "{}/auth/profile-image/{}?token={}",
                self.config.api_path, public_id, token
            ),
            expires_in_secs: self.tokens.image_token_ttl_secs(),
        })
    }

    /// Serve an image out of band, authorized by an image-access token
    ///
    /// The token must match both the account behind `public_id` and the
    /// currently stored image; replacing the image kills older tokens.
    pub async fn serve_with_token(
        &self,
        public_id: &str,
        token: &str,
    ) -> AuthResult<ServedImage> {
        let claims = self.tokens.verify_image_token(token)?;

        let public_id = PublicId::parse_str(public_id).map_err(|_| AuthError::SessionInvalid)?;
        let account = self
            .repo
            .find_by_public_id(&public_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if claims.sub != account.account_id.to_string() {
            return Err(AuthError::SessionInvalid);
        }

        let image = self
            .load_image(&account.account_id)
            .await?
            .ok_or(AuthError::ImageNotFound)?;

        if claims.img != image.image_id.to_string() {
            return Err(AuthError::SessionInvalid);
        }

        self.decrypt(image)
    }

    async fn load_image(&self, account_id: &AccountId) -> AuthResult<Option<ProfileImage>> {
        self.repo.find_by_account(account_id).await
    }

    /// Decrypt fails closed; a tampered record surfaces as "re-upload"
    fn decrypt(&self, image: ProfileImage) -> AuthResult<ServedImage> {
        let bytes = self
            .cipher
            .decrypt(&image.ciphertext, &image.iv, &image.auth_tag)?;

        Ok(ServedImage {
            bytes,
            mime_type: image.mime_type,
        })
    }
}
