//! MFA Setup Use Case
//!
//! Two-step enable flow:
//! 1. `setup` generates and stores a secret, **unenabled**
//! 2. `verify` checks a current code, enables MFA, and returns the
//!    single-use backup codes exactly once

use std::sync::Arc;

use crate::domain::repository::AccountRepository;
use crate::domain::value_object::account_id::AccountId;
use crate::domain::value_object::backup_codes::BackupCodeSet;
use crate::error::{AuthError, AuthResult};

/// MFA setup output
pub struct MfaSetupOutput {
    /// Base32 secret for manual entry
    pub secret: String,
    /// otpauth:// URL for authenticator apps
    pub otpauth_url: String,
    /// QR code as base64-encoded PNG
    pub qr_code_base64: String,
}

/// MFA verify output
pub struct MfaVerifyOutput {
    /// Plaintext backup codes — returned here and never recoverable again
    pub backup_codes: Vec<String>,
}

/// MFA setup use case
pub struct MfaSetupUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> MfaSetupUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Start MFA setup: generate a new secret
    ///
    /// Rejected while MFA is already enabled; re-running setup before the
    /// first verify simply replaces the pending secret.
    pub async fn setup(&self, account_id: &AccountId) -> AuthResult<MfaSetupOutput> {
        let mut account = self
            .repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if account.mfa_enabled {
            return Err(AuthError::MfaAlreadyEnabled);
        }

        let secret = account.setup_mfa();
        self.repo.update_mfa(&account).await?;

        let account_name = account.identifier();

        let otpauth_url = secret
            .get_otpauth_url(account_name)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let qr_code_base64 = secret
            .generate_qr_code(account_name)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(public_id = %account.public_id, "MFA setup initiated");

        Ok(MfaSetupOutput {
            secret: secret.as_base32().to_string(),
            otpauth_url,
            qr_code_base64,
        })
    }

    /// Verify a code against the pending secret and enable MFA
    pub async fn verify(&self, account_id: &AccountId, code: &str) -> AuthResult<MfaVerifyOutput> {
        let mut account = self
            .repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if account.mfa_enabled {
            return Err(AuthError::MfaAlreadyEnabled);
        }

        let secret = account
            .mfa_secret
            .clone()
            .ok_or(AuthError::MfaNotConfigured)?;

        let account_name = account.identifier().to_string();
        let valid = secret
            .verify(code, &account_name)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !valid {
            return Err(AuthError::InvalidMfaCode);
        }

        let (plain_codes, hashed_set) = BackupCodeSet::issue()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        account.enable_mfa(hashed_set);
        self.repo.update_mfa(&account).await?;

        tracing::info!(public_id = %account.public_id, "MFA enabled");

        Ok(MfaVerifyOutput {
            backup_codes: plain_codes,
        })
    }
}
