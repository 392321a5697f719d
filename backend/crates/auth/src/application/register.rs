//! Register Use Case
//!
//! Creates a new account and signs it in.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, TokenService};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    account_password::{AccountPassword, RawPassword},
    email::Email,
    phone::Phone,
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

/// Register output
pub struct RegisterOutput {
    pub account: Account,
    pub pair: TokenPair,
}

/// Register use case
pub struct RegisterUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    tokens: Arc<TokenService>,
}

impl<R> RegisterUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, tokens: Arc<TokenService>) -> Self {
        Self {
            repo,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        // Validate identifiers
        let email = input
            .email
            .filter(|e| !e.trim().is_empty())
            .map(Email::new)
            .transpose()
            .map_err(AuthError::from)?;

        let phone = input
            .phone
            .filter(|p| !p.trim().is_empty())
            .map(Phone::new)
            .transpose()
            .map_err(AuthError::from)?;

        if email.is_none() && phone.is_none() {
            return Err(AuthError::InvalidInput(
                "Either email or phone is required".to_string(),
            ));
        }

        // Uniqueness checks (the store's unique indexes are the backstop
        // against races; see the infra layer)
        if let Some(email) = &email {
            if self.repo.exists_by_email(email).await? {
                return Err(AuthError::IdentifierTaken);
            }
        }
        if let Some(phone) = &phone {
            if self.repo.exists_by_phone(phone).await? {
                return Err(AuthError::IdentifierTaken);
            }
        }

        // Validate and hash password
        let raw_password = RawPassword::new(input.password).map_err(AuthError::from)?;
        let password_hash = AccountPassword::from_raw(&raw_password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // Create and persist the account (token_version starts at 0)
        let account = Account::new(email, phone, password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.repo.create(&account).await?;

        // Sign the fresh account in
        let pair = self.tokens.issue_pair(&account, account.token_version)?;

        tracing::info!(
            public_id = %account.public_id,
            identifier = %account.identifier(),
            "Account registered"
        );

        Ok(RegisterOutput { account, pair })
    }
}
