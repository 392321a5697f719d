//! Login Use Case
//!
//! Authenticates credentials, enforces the login throttle and the MFA gate,
//! and issues a fresh token pair.
//!
//! Ordering matters: the throttle is consulted before any account lookup or
//! password verification so a saturated key never reaches the (deliberately
//! expensive) hasher.

use std::sync::Arc;

use platform::throttle::{ThrottleStore, throttle_key};

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, TokenService};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    account_password::RawPassword, email::Email, phone::Phone,
};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    /// Email or phone
    pub identifier: String,
    /// Password
    pub password: String,
    /// TOTP or backup code (mandatory when MFA is enabled)
    pub mfa_code: Option<String>,
    /// Caller network origin (throttle key component)
    pub origin: String,
}

/// Login output
pub struct LoginOutput {
    pub account: Account,
    pub pair: TokenPair,
}

/// Login use case
pub struct LoginUseCase<R, T>
where
    R: AccountRepository,
    T: ThrottleStore + Send + Sync,
{
    repo: Arc<R>,
    throttle: Arc<T>,
    config: Arc<AuthConfig>,
    tokens: Arc<TokenService>,
}

impl<R, T> LoginUseCase<R, T>
where
    R: AccountRepository,
    T: ThrottleStore + Send + Sync,
{
    pub fn new(
        repo: Arc<R>,
        throttle: Arc<T>,
        config: Arc<AuthConfig>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            repo,
            throttle,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let key = throttle_key(&input.identifier, &input.origin);

        // Saturated keys are rejected before any store or hasher work
        if self.throttle.is_limited(&key).await {
            return Err(AuthError::RateLimited);
        }

        let Some(mut account) = self.find_by_identifier(&input.identifier).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        // Verify password
        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        if !account.password_hash.verify(&raw_password, self.config.pepper()) {
            let failures = self.throttle.record_failure(&key).await;
            tracing::warn!(
                public_id = %account.public_id,
                failures,
                "Password verification failed"
            );
            return Err(AuthError::InvalidCredentials);
        }

        // MFA gate: code failures count toward the same throttle key as
        // password failures, so code guessing cannot bypass the limiter
        if account.requires_mfa() {
            self.check_mfa(&mut account, input.mfa_code.as_deref(), &key)
                .await?;
        }

        // Correct credentials earn a clean slate
        self.throttle.clear(&key).await;

        account.record_login();
        self.repo.record_login(&account.account_id).await?;

        let pair = self.tokens.issue_pair(&account, account.token_version)?;

        tracing::info!(public_id = %account.public_id, "Account signed in");

        Ok(LoginOutput { account, pair })
    }

    async fn check_mfa(
        &self,
        account: &mut Account,
        code: Option<&str>,
        key: &str,
    ) -> AuthResult<()> {
        let Some(code) = code else {
            self.throttle.record_failure(key).await;
            tracing::warn!(public_id = %account.public_id, "MFA code required but missing");
            return Err(AuthError::MfaCodeMissing);
        };

        let secret = account
            .mfa_secret
            .clone()
            .ok_or_else(|| AuthError::Internal("MFA enabled without a secret".to_string()))?;

        let account_name = account.identifier().to_string();
        let totp_ok = secret
            .verify(code, &account_name)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if totp_ok {
            return Ok(());
        }

        // Fall back to single-use backup codes
        if account.consume_backup_code(code) {
            self.repo.update_mfa(account).await?;
            tracing::info!(
                public_id = %account.public_id,
                remaining = account.mfa_backup_codes.remaining(),
                "Backup code consumed"
            );
            return Ok(());
        }

        self.throttle.record_failure(key).await;
        tracing::warn!(public_id = %account.public_id, "MFA code verification failed");
        Err(AuthError::InvalidMfaCode)
    }

    /// Find account by email or phone; invalid formats read as "no account"
    async fn find_by_identifier(&self, identifier: &str) -> AuthResult<Option<Account>> {
        if identifier.contains('@') {
            match Email::new(identifier) {
                Ok(email) => self.repo.find_by_email(&email).await,
                Err(_) => Ok(None),
            }
        } else {
            match Phone::new(identifier) {
                Ok(phone) => self.repo.find_by_phone(&phone).await,
                Err(_) => Ok(None),
            }
        }
    }
}
