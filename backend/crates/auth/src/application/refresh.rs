//! Refresh Use Case
//!
//! Rotates the token pair. The single check that makes revocation work:
//! the refresh token's embedded version must equal the account's current
//! `token_version`. The version is then bumped atomically in the store, so
//! the just-used token (and any copy of it) is dead for every other holder.

use std::sync::Arc;

use crate::application::tokens::{TokenPair, TokenService};
use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::error::{AuthError, AuthResult};

/// Refresh output
pub struct RefreshOutput {
    pub account: Account,
    pub pair: TokenPair,
}

/// Refresh use case
pub struct RefreshUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> RefreshUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let account_id = claims.account_id()?;

        let account = self
            .repo
            .find_by_id(&account_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if claims.ver != account.token_version {
            tracing::warn!(
                public_id = %account.public_id,
                token_version = claims.ver,
                current_version = account.token_version,
                "Refresh token version mismatch (revoked or replayed)"
            );
            return Err(AuthError::SessionInvalid);
        }

        // Store-native atomic increment; racing refreshes are sequenced here
        let new_version = self.repo.bump_token_version(&account_id).await?;

        let pair = self.tokens.issue_pair(&account, new_version)?;

        tracing::debug!(public_id = %account.public_id, "Token pair rotated");

        Ok(RefreshOutput { account, pair })
    }
}
