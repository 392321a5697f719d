//! At-Rest Blob Encryption
//!
//! AES-256-GCM with a random 16-byte IV and 16-byte authentication tag per
//! encryption. Decryption fails closed: a tampered ciphertext, wrong IV, or
//! mismatched tag yields an error, never partial or corrupted plaintext.
//!
//! The key is derived once from an operator-supplied secret: used as-is when
//! it is exactly key-length, otherwise normalized through SHA-256 (never
//! truncated or padded).

use aes_gcm::aead::Aead;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, KeyInit};
use thiserror::Error;

use crate::crypto::{random_bytes, sha256};

/// AES-256-GCM parameterized with a 128-bit nonce
type BlobAead = AesGcm<Aes256, U16>;

/// Key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;
/// IV length in bytes
pub const IV_LEN: usize = 16;
/// Authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Cipher errors
///
/// Decrypt failures carry no detail on purpose — callers surface them as
/// "blob unreadable", not as a crypto diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("encryption key must be at least {KEY_LEN} characters")]
    KeyTooShort,

    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed")]
    DecryptFailed,
}

/// Result of one encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
}

/// Authenticated symmetric cipher for binary secrets
pub struct BlobCipher {
    aead: BlobAead,
}

impl std::fmt::Debug for BlobCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobCipher").finish_non_exhaustive()
    }
}

impl BlobCipher {
    /// Derive the key from an operator secret and build the cipher
    ///
    /// Secrets shorter than [`KEY_LEN`] bytes are rejected. A secret of
    /// exactly key length is used directly; longer secrets are normalized
    /// through SHA-256.
    pub fn from_secret(secret: &str) -> Result<Self, CipherError> {
        let bytes = secret.as_bytes();
        if bytes.len() < KEY_LEN {
            return Err(CipherError::KeyTooShort);
        }

        let key: [u8; KEY_LEN] = if bytes.len() == KEY_LEN {
            // Length is checked above, the conversion cannot fail
            bytes.try_into().map_err(|_| CipherError::KeyTooShort)?
        } else {
            sha256(bytes)
        };

        Ok(Self {
            aead: BlobAead::new(GenericArray::from_slice(&key)),
        })
    }

    /// Encrypt a plaintext under a fresh random IV
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedBlob, CipherError> {
        let iv_bytes = random_bytes(IV_LEN);
        let iv: [u8; IV_LEN] = iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CipherError::EncryptFailed)?;

        // The aead crate appends the tag to the ciphertext; store it apart
        let mut sealed = self
            .aead
            .encrypt(GenericArray::from_slice(&iv), plaintext)
            .map_err(|_| CipherError::EncryptFailed)?;

        if sealed.len() < TAG_LEN {
            return Err(CipherError::EncryptFailed);
        }
        let tag_vec = sealed.split_off(sealed.len() - TAG_LEN);
        let tag: [u8; TAG_LEN] = tag_vec
            .as_slice()
            .try_into()
            .map_err(|_| CipherError::EncryptFailed)?;

        Ok(EncryptedBlob {
            ciphertext: sealed,
            iv,
            tag,
        })
    }

    /// Decrypt and authenticate a stored blob
    ///
    /// Any tamper of ciphertext, IV, or tag fails with [`CipherError::DecryptFailed`].
    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8], tag: &[u8]) -> Result<Vec<u8>, CipherError> {
        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(CipherError::DecryptFailed);
        }

        let mut sealed = ciphertext.to_vec();
        sealed.extend_from_slice(tag);

        self.aead
            .decrypt(GenericArray::from_slice(iv), sealed.as_slice())
            .map_err(|_| CipherError::DecryptFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn cipher() -> BlobCipher {
        BlobCipher::from_secret(SECRET).unwrap()
    }

    #[test]
    fn test_key_too_short_rejected() {
        assert_eq!(
            BlobCipher::from_secret("short").unwrap_err(),
            CipherError::KeyTooShort
        );
    }

    #[test]
    fn test_long_secret_is_normalized() {
        let long = "an operator secret that is much longer than thirty-two bytes";
        let cipher = BlobCipher::from_secret(long).unwrap();
        let blob = cipher.encrypt(b"payload").unwrap();
        assert_eq!(cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag).unwrap(), b"payload");
    }

    #[test]
    fn test_roundtrip() {
        let cipher = cipher();
        let plaintext = b"\x89PNG\r\n\x1a\n fake image bytes";
        let blob = cipher.encrypt(plaintext).unwrap();

        assert_eq!(blob.iv.len(), IV_LEN);
        assert_eq!(blob.tag.len(), TAG_LEN);
        assert_ne!(blob.ciphertext, plaintext.to_vec());

        let decrypted = cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let cipher = cipher();
        let blob = cipher.encrypt(b"").unwrap();
        assert_eq!(cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag).unwrap(), b"");
    }

    #[test]
    fn test_iv_unique_per_encryption() {
        let cipher = cipher();
        let a = cipher.encrypt(b"same plaintext").unwrap();
        let b = cipher.encrypt(b"same plaintext").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = cipher();
        let mut blob = cipher.encrypt(b"sensitive bytes").unwrap();
        blob.ciphertext[0] ^= 0x01;
        assert_eq!(
            cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag),
            Err(CipherError::DecryptFailed)
        );
    }

    #[test]
    fn test_tampered_iv_fails() {
        let cipher = cipher();
        let mut blob = cipher.encrypt(b"sensitive bytes").unwrap();
        blob.iv[3] ^= 0x80;
        assert_eq!(
            cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag),
            Err(CipherError::DecryptFailed)
        );
    }

    #[test]
    fn test_tampered_tag_fails() {
        let cipher = cipher();
        let mut blob = cipher.encrypt(b"sensitive bytes").unwrap();
        blob.tag[TAG_LEN - 1] ^= 0x01;
        assert_eq!(
            cipher.decrypt(&blob.ciphertext, &blob.iv, &blob.tag),
            Err(CipherError::DecryptFailed)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = cipher().encrypt(b"sensitive bytes").unwrap();
        let other = BlobCipher::from_secret("fedcba9876543210fedcba9876543210").unwrap();
        assert_eq!(
            other.decrypt(&blob.ciphertext, &blob.iv, &blob.tag),
            Err(CipherError::DecryptFailed)
        );
    }
}
