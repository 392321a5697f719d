//! Logout Use Case
//!
//! Bumping `token_version` invalidates every outstanding refresh token for
//! the account ("log out everywhere"). An unauthenticated logout is not an
//! error; the handler clears cookies either way.

use std::sync::Arc;

use crate::application::tokens::TokenService;
use crate::domain::repository::AccountRepository;
use crate::error::AuthResult;

/// Logout use case
pub struct LogoutUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> LogoutUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Revoke all refresh tokens for the caller, if authenticated
    pub async fn execute(&self, access_token: Option<&str>) -> AuthResult<()> {
        let Some(token) = access_token else {
            return Ok(());
        };

        let Ok(claims) = self.tokens.verify_access(token) else {
            // A dead access token still gets its cookies cleared
            return Ok(());
        };

        let account_id = claims.account_id()?;
        self.repo.bump_token_version(&account_id).await?;

        tracing::info!(public_id = %claims.pid, "Account signed out everywhere");

        Ok(())
    }
}
