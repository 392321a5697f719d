//! Account Entity
//!
//! Identity record for the subsystem. Carries the credential material and
//! the per-account `token_version` that makes stateless revocation work:
//! a refresh token is honored only while its embedded version equals the
//! account's current one.

use chrono::{DateTime, Utc};
use kernel::error::app_error::{AppError, AppResult};

use crate::domain::value_object::{
    account_id::AccountId, account_password::AccountPassword, account_role::AccountRole,
    backup_codes::BackupCodeSet, email::Email, phone::Phone, public_id::PublicId,
    totp_secret::TotpSecret,
};

/// Account entity
///
/// Invariant: at least one of email/phone is present (constructor-enforced).
/// `token_version` is only ever bumped through the repository's atomic
/// increment; the in-memory value is a snapshot.
#[derive(Debug, Clone)]
pub struct Account {
    /// Internal UUID identifier (never serialized out)
    pub account_id: AccountId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// Email, unique case-insensitively
    pub email: Option<Email>,
    /// Phone, unique after normalization
    pub phone: Option<Phone>,
    /// Argon2id password hash
    pub password_hash: AccountPassword,
    /// Role (User, Admin)
    pub role: AccountRole,
    /// Monotonic counter backing refresh-token revocation
    pub token_version: i32,
    /// Whether TOTP MFA is enabled and verified
    pub mfa_enabled: bool,
    /// TOTP secret (present but unenabled during setup)
    pub mfa_secret: Option<TotpSecret>,
    /// Hashed single-use backup codes
    pub mfa_backup_codes: BackupCodeSet,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account
    ///
    /// Fails when neither email nor phone is given.
    pub fn new(
        email: Option<Email>,
        phone: Option<Phone>,
        password_hash: AccountPassword,
    ) -> AppResult<Self> {
        if email.is_none() && phone.is_none() {
            return Err(AppError::bad_request("Either email or phone is required"));
        }

        let now = Utc::now();
        Ok(Self {
            account_id: AccountId::new(),
            public_id: PublicId::new(),
            email,
            phone,
            password_hash,
            role: AccountRole::default(),
            token_version: 0,
            mfa_enabled: false,
            mfa_secret: None,
            mfa_backup_codes: BackupCodeSet::empty(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Identifier used as the TOTP account name and in logs
    pub fn identifier(&self) -> &str {
        if let Some(email) = &self.email {
            email.as_str()
        } else if let Some(phone) = &self.phone {
            phone.as_str()
        } else {
            // Unreachable by construction
            ""
        }
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Start MFA setup: generate a new secret, not yet enabled
    pub fn setup_mfa(&mut self) -> TotpSecret {
        let secret = TotpSecret::generate();
        self.mfa_secret = Some(secret.clone());
        self.mfa_enabled = false;
        self.updated_at = Utc::now();
        secret
    }

    /// Enable MFA after the setup code verified; stores the backup codes
    pub fn enable_mfa(&mut self, backup_codes: BackupCodeSet) {
        if self.mfa_secret.is_some() {
            self.mfa_enabled = true;
            self.mfa_backup_codes = backup_codes;
            self.updated_at = Utc::now();
        }
    }

    /// Is an MFA code mandatory at login?
    pub fn requires_mfa(&self) -> bool {
        self.mfa_enabled && self.mfa_secret.is_some()
    }

    /// Try to consume a backup code; true when an unused code matched
    pub fn consume_backup_code(&mut self, code: &str) -> bool {
        let consumed = self.mfa_backup_codes.consume(code);
        if consumed {
            self.updated_at = Utc::now();
        }
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::account_password::RawPassword;

    fn password() -> AccountPassword {
        let raw = RawPassword::new("p@ssw0rd1".to_string()).unwrap();
        AccountPassword::from_raw(&raw, None).unwrap()
    }

    #[test]
    fn test_new_requires_contact() {
        let result = Account::new(None, None, password());
        assert!(result.is_err());
    }

    #[test]
    fn test_new_with_email() {
        let email = Email::new("a@x.com").unwrap();
        let account = Account::new(Some(email), None, password()).unwrap();

        assert_eq!(account.token_version, 0);
        assert_eq!(account.role, AccountRole::User);
        assert!(!account.mfa_enabled);
        assert_eq!(account.identifier(), "a@x.com");
    }

    #[test]
    fn test_new_with_phone_only() {
        let phone = Phone::new("+819012345678").unwrap();
        let account = Account::new(None, Some(phone), password()).unwrap();
        assert_eq!(account.identifier(), "+819012345678");
    }

    #[test]
    fn test_mfa_setup_then_enable() {
        let email = Email::new("a@x.com").unwrap();
        let mut account = Account::new(Some(email), None, password()).unwrap();

        let secret = account.setup_mfa();
        assert!(!account.mfa_enabled);
        assert_eq!(
            account.mfa_secret.as_ref().unwrap().as_base32(),
            secret.as_base32()
        );
        assert!(!account.requires_mfa());

        account.enable_mfa(BackupCodeSet::empty());
        assert!(account.mfa_enabled);
        assert!(account.requires_mfa());
    }

    #[test]
    fn test_enable_without_setup_is_noop() {
        let email = Email::new("a@x.com").unwrap();
        let mut account = Account::new(Some(email), None, password()).unwrap();

        account.enable_mfa(BackupCodeSet::empty());
        assert!(!account.mfa_enabled);
    }
}
