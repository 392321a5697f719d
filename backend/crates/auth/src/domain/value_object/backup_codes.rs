//! MFA Backup Codes
//!
//! Fixed-size set of single-use recovery codes generated when MFA is
//! enabled. Plaintext codes leave this module exactly once, at issue time;
//! only Argon2id hashes are stored, so the set is verifiable but never
//! recoverable.

use kernel::error::app_error::{AppError, AppResult};
use platform::crypto::random_bytes;
use platform::password::{hash_opaque, verify_opaque};
use serde::{Deserialize, Serialize};

/// Number of codes issued per enablement
pub const BACKUP_CODE_COUNT: usize = 10;

/// Random bytes per code (rendered as 10 hex chars)
const BACKUP_CODE_BYTES: usize = 5;

/// Stored backup-code set (hashes only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupCodeSet {
    hashes: Vec<String>,
}

impl BackupCodeSet {
    /// Empty set (MFA not enabled, or all codes consumed)
    pub fn empty() -> Self {
        Self { hashes: Vec::new() }
    }

    /// Restore from stored hashes
    pub fn from_hashes(hashes: Vec<String>) -> Self {
        Self { hashes }
    }

    /// Issue a fresh set
    ///
    /// Returns the plaintext codes (shown to the caller once, never again)
    /// and the hashed set for storage.
    pub fn issue() -> AppResult<(Vec<String>, Self)> {
        let mut plain = Vec::with_capacity(BACKUP_CODE_COUNT);
        let mut hashes = Vec::with_capacity(BACKUP_CODE_COUNT);

        for _ in 0..BACKUP_CODE_COUNT {
            let code = render_code(&random_bytes(BACKUP_CODE_BYTES));
            let hash = hash_opaque(code.as_bytes())
                .map_err(|e| AppError::internal(format!("Backup code hashing failed: {}", e)))?;
            plain.push(code);
            hashes.push(hash);
        }

        Ok((plain, Self { hashes }))
    }

    /// Try to consume a code; a matching code is removed from the set
    ///
    /// Returns `true` when the code matched an unused entry.
    pub fn consume(&mut self, code: &str) -> bool {
        let normalized = code.trim().to_lowercase();

        let matched = self
            .hashes
            .iter()
            .position(|hash| verify_opaque(normalized.as_bytes(), hash));

        match matched {
            Some(idx) => {
                self.hashes.remove(idx);
                true
            }
            None => false,
        }
    }

    /// How many codes remain unused
    pub fn remaining(&self) -> usize {
        self.hashes.len()
    }

    /// Stored hashes (for persistence)
    pub fn as_hashes(&self) -> &[String] {
        &self.hashes
    }
}

/// Render 5 random bytes as "xxxxx-xxxxx"
fn render_code(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", &hex[..5], &hex[5..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_code_format() {
        let code = render_code(&[0xab, 0xcd, 0xef, 0x01, 0x23]);
        assert_eq!(code, "abcde-f0123");
    }

    #[test]
    fn test_issue_count_and_uniqueness() {
        let (plain, set) = BackupCodeSet::issue().unwrap();
        assert_eq!(plain.len(), BACKUP_CODE_COUNT);
        assert_eq!(set.remaining(), BACKUP_CODE_COUNT);

        let mut unique = plain.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), BACKUP_CODE_COUNT);

        // Stored form is hashes, not the codes themselves
        for code in &plain {
            assert!(!set.as_hashes().contains(code));
        }
    }

    #[test]
    fn test_consume_is_single_use() {
        let (plain, mut set) = BackupCodeSet::issue().unwrap();
        let code = &plain[0];

        assert!(set.consume(code));
        assert_eq!(set.remaining(), BACKUP_CODE_COUNT - 1);

        // Second use of the same code fails
        assert!(!set.consume(code));
    }

    #[test]
    fn test_consume_rejects_unknown_code() {
        let (_, mut set) = BackupCodeSet::issue().unwrap();
        assert!(!set.consume("00000-00000"));
        assert_eq!(set.remaining(), BACKUP_CODE_COUNT);
    }

    #[test]
    fn test_consume_normalizes_input() {
        let (plain, mut set) = BackupCodeSet::issue().unwrap();
        let shouty = format!("  {}  ", plain[1].to_uppercase());
        assert!(set.consume(&shouty));
    }
}
