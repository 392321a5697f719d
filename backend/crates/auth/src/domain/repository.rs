//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer (Postgres in production, in-memory for tests).

use crate::domain::entity::{account::Account, profile_image::ProfileImage};
use crate::domain::value_object::{
    account_id::AccountId, email::Email, phone::Phone, public_id::PublicId,
};
use crate::error::AuthResult;

/// Account repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a new account
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Find account by internal ID
    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>>;

    /// Find account by public ID
    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<Account>>;

    /// Find account by email (already lowercased by the value object)
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;

    /// Find account by normalized phone
    async fn find_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>>;

    /// Check if an email is taken
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Check if a phone is taken
    async fn exists_by_phone(&self, phone: &Phone) -> AuthResult<bool>;

    /// Persist MFA state changes (secret, enabled flag, backup codes)
    async fn update_mfa(&self, account: &Account) -> AuthResult<()>;

    /// Record a successful login timestamp
    async fn record_login(&self, account_id: &AccountId) -> AuthResult<()>;

    /// Atomically increment `token_version`, returning the new value.
    ///
    /// Must be a store-native read-modify-write; concurrent refreshes for
    /// the same account are sequenced here, not at the application layer.
    async fn bump_token_version(&self, account_id: &AccountId) -> AuthResult<i32>;
}

/// Profile image repository trait
#[trait_variant::make(ProfileImageRepository: Send)]
pub trait LocalProfileImageRepository {
    /// Insert or replace the account's image
    async fn upsert(&self, image: &ProfileImage) -> AuthResult<()>;

    /// Load the account's image, if any
    async fn find_by_account(&self, account_id: &AccountId) -> AuthResult<Option<ProfileImage>>;
}
