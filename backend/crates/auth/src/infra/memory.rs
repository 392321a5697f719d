//! In-Memory Repository Implementation
//!
//! Mutexed maps behind the same repository traits as Postgres. Backs the
//! crate tests and local development; `bump_token_version` mutates under a
//! single lock to mirror the store-native atomic increment.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entity::{account::Account, profile_image::ProfileImage};
use crate::domain::repository::{AccountRepository, ProfileImageRepository};
use crate::domain::value_object::{
    account_id::AccountId, email::Email, phone::Phone, public_id::PublicId,
};
use crate::error::{AuthError, AuthResult};

/// In-memory account + profile image repository
#[derive(Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<Mutex<HashMap<Uuid, Account>>>,
    images: Arc<Mutex<HashMap<Uuid, ProfileImage>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_where<F>(&self, predicate: F) -> Option<Account>
    where
        F: Fn(&Account) -> bool,
    {
        self.accounts
            .lock()
            .expect("accounts lock poisoned")
            .values()
            .find(|a| predicate(a))
            .cloned()
    }
}

impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().expect("accounts lock poisoned");

        let duplicate = accounts.values().any(|a| {
            (account.email.is_some() && a.email == account.email)
                || (account.phone.is_some() && a.phone == account.phone)
        });
        if duplicate {
            return Err(AuthError::IdentifierTaken);
        }

        accounts.insert(account.account_id.into_uuid(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .expect("accounts lock poisoned")
            .get(account_id.as_uuid())
            .cloned())
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<Account>> {
        Ok(self.find_where(|a| a.public_id == *public_id))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        Ok(self.find_where(|a| a.email.as_ref() == Some(email)))
    }

    async fn find_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>> {
        Ok(self.find_where(|a| a.phone.as_ref() == Some(phone)))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.find_where(|a| a.email.as_ref() == Some(email)).is_some())
    }

    async fn exists_by_phone(&self, phone: &Phone) -> AuthResult<bool> {
        Ok(self.find_where(|a| a.phone.as_ref() == Some(phone)).is_some())
    }

    async fn update_mfa(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
        let stored = accounts
            .get_mut(account.account_id.as_uuid())
            .ok_or(AuthError::AccountNotFound)?;

        stored.mfa_enabled = account.mfa_enabled;
        stored.mfa_secret = account.mfa_secret.clone();
        stored.mfa_backup_codes = account.mfa_backup_codes.clone();
        stored.updated_at = account.updated_at;
        Ok(())
    }

    async fn record_login(&self, account_id: &AccountId) -> AuthResult<()> {
        let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
        let stored = accounts
            .get_mut(account_id.as_uuid())
            .ok_or(AuthError::AccountNotFound)?;

        let now = Utc::now();
        stored.last_login_at = Some(now);
        stored.updated_at = now;
        Ok(())
    }

    async fn bump_token_version(&self, account_id: &AccountId) -> AuthResult<i32> {
        let mut accounts = self.accounts.lock().expect("accounts lock poisoned");
        let stored = accounts
            .get_mut(account_id.as_uuid())
            .ok_or(AuthError::AccountNotFound)?;

        stored.token_version += 1;
        stored.updated_at = Utc::now();
        Ok(stored.token_version)
    }
}

impl ProfileImageRepository for InMemoryAccountRepository {
    async fn upsert(&self, image: &ProfileImage) -> AuthResult<()> {
        self.images
            .lock()
            .expect("images lock poisoned")
            .insert(image.account_id.into_uuid(), image.clone());
        Ok(())
    }

    async fn find_by_account(&self, account_id: &AccountId) -> AuthResult<Option<ProfileImage>> {
        Ok(self
            .images
            .lock()
            .expect("images lock poisoned")
            .get(account_id.as_uuid())
            .cloned())
    }
}
