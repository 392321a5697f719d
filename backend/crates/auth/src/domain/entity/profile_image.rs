//! Profile Image Entity
//!
//! Encrypted-at-rest binary blob. One image per account; uploading again
//! replaces the record and rotates `image_id`, which invalidates any
//! outstanding image-access tokens bound to the old id.

use chrono::{DateTime, Utc};
use platform::cipher::EncryptedBlob;

use crate::domain::value_object::account_id::{AccountId, ImageId};

/// Encrypted profile image record
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub image_id: ImageId,
    pub account_id: AccountId,
    /// AES-256-GCM ciphertext (tag stored separately)
    pub ciphertext: Vec<u8>,
    /// 16-byte IV, unique per encryption
    pub iv: Vec<u8>,
    /// 16-byte authentication tag
    pub auth_tag: Vec<u8>,
    /// Original MIME type, replayed on serve
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl ProfileImage {
    /// Create a record from one encryption result
    pub fn new(account_id: AccountId, blob: EncryptedBlob, mime_type: String) -> Self {
        Self {
            image_id: ImageId::new(),
            account_id,
            ciphertext: blob.ciphertext,
            iv: blob.iv.to_vec(),
            auth_tag: blob.tag.to_vec(),
            mime_type,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::cipher::BlobCipher;

    #[test]
    fn test_new_fresh_image_id_per_upload() {
        let cipher = BlobCipher::from_secret("0123456789abcdef0123456789abcdef").unwrap();
        let account_id = AccountId::new();

        let a = ProfileImage::new(
            account_id,
            cipher.encrypt(b"img").unwrap(),
            "image/png".to_string(),
        );
        let b = ProfileImage::new(
            account_id,
            cipher.encrypt(b"img").unwrap(),
            "image/png".to_string(),
        );

        assert_ne!(a.image_id, b.image_id);
        assert_eq!(a.iv.len(), 16);
        assert_eq!(a.auth_tag.len(), 16);
    }
}
