//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{account::Account, profile_image::ProfileImage};
use crate::domain::repository::{AccountRepository, ProfileImageRepository};
use crate::domain::value_object::{
    account_id::{AccountId, ImageId},
    account_password::AccountPassword,
    account_role::AccountRole,
    backup_codes::BackupCodeSet,
    email::Email,
    phone::Phone,
    public_id::PublicId,
    totp_secret::TotpSecret,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    public_id,
    email,
    phone,
    password_hash,
    account_role,
    token_version,
    mfa_enabled,
    mfa_secret,
    mfa_backup_codes,
    last_login_at,
    created_at,
    updated_at
"#;

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id,
                public_id,
                email,
                phone,
                password_hash,
                account_role,
                token_version,
                mfa_enabled,
                mfa_secret,
                mfa_backup_codes,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.public_id.as_str())
        .bind(account.email.as_ref().map(|e| e.as_str()))
        .bind(account.phone.as_ref().map(|p| p.as_str()))
        .bind(account.password_hash.as_phc_string())
        .bind(account.role.id())
        .bind(account.token_version)
        .bind(account.mfa_enabled)
        .bind(account.mfa_secret.as_ref().map(|s| s.as_base32()))
        .bind(account.mfa_backup_codes.as_hashes().to_vec())
        .bind(account.last_login_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = $1"
        ))
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE public_id = $1"
        ))
        .bind(public_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn find_by_phone(&self, phone: &Phone) -> AuthResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE phone = $1"
        ))
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_phone(&self, phone: &Phone) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE phone = $1)",
        )
        .bind(phone.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_mfa(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                mfa_enabled = $2,
                mfa_secret = $3,
                mfa_backup_codes = $4,
                updated_at = $5
            WHERE account_id = $1
            "#,
        )
        .bind(account.account_id.as_uuid())
        .bind(account.mfa_enabled)
        .bind(account.mfa_secret.as_ref().map(|s| s.as_base32()))
        .bind(account.mfa_backup_codes.as_hashes().to_vec())
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_login(&self, account_id: &AccountId) -> AuthResult<()> {
        sqlx::query(
            "UPDATE accounts SET last_login_at = NOW(), updated_at = NOW() WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn bump_token_version(&self, account_id: &AccountId) -> AuthResult<i32> {
        // Store-native atomic read-modify-write: concurrent refreshes for
        // one account are sequenced by this statement
        let version = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE accounts
            SET token_version = token_version + 1, updated_at = NOW()
            WHERE account_id = $1
            RETURNING token_version
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

        Ok(version)
    }
}

// ============================================================================
// Profile Image Repository Implementation
// ============================================================================

impl ProfileImageRepository for PgAccountRepository {
    async fn upsert(&self, image: &ProfileImage) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profile_images (
                image_id,
                account_id,
                ciphertext,
                iv,
                auth_tag,
                mime_type,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (account_id) DO UPDATE SET
                image_id = EXCLUDED.image_id,
                ciphertext = EXCLUDED.ciphertext,
                iv = EXCLUDED.iv,
                auth_tag = EXCLUDED.auth_tag,
                mime_type = EXCLUDED.mime_type,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(image.image_id.as_uuid())
        .bind(image.account_id.as_uuid())
        .bind(&image.ciphertext)
        .bind(&image.iv)
        .bind(&image.auth_tag)
        .bind(&image.mime_type)
        .bind(image.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_account(&self, account_id: &AccountId) -> AuthResult<Option<ProfileImage>> {
        let row = sqlx::query_as::<_, ProfileImageRow>(
            r#"
            SELECT image_id, account_id, ciphertext, iv, auth_tag, mime_type, created_at
            FROM profile_images
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_image()))
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    public_id: String,
    email: Option<String>,
    phone: Option<String>,
    password_hash: String,
    account_role: i16,
    token_version: i32,
    mfa_enabled: bool,
    mfa_secret: Option<String>,
    mfa_backup_codes: Vec<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> AuthResult<Account> {
        let public_id = PublicId::parse_str(&self.public_id)
            .map_err(|e| AuthError::Internal(format!("Corrupt public_id in accounts: {}", e)))?;

        let password_hash = AccountPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let role = AccountRole::from_id(self.account_role)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let mfa_secret = self
            .mfa_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Account {
            account_id: AccountId::from_uuid(self.account_id),
            public_id,
            email: self.email.map(Email::from_db),
            phone: self.phone.map(Phone::from_db),
            password_hash,
            role,
            token_version: self.token_version,
            mfa_enabled: self.mfa_enabled,
            mfa_secret,
            mfa_backup_codes: BackupCodeSet::from_hashes(self.mfa_backup_codes),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileImageRow {
    image_id: Uuid,
    account_id: Uuid,
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    auth_tag: Vec<u8>,
    mime_type: String,
    created_at: DateTime<Utc>,
}

impl ProfileImageRow {
    fn into_image(self) -> ProfileImage {
        ProfileImage {
            image_id: ImageId::from_uuid(self.image_id),
            account_id: AccountId::from_uuid(self.account_id),
            ciphertext: self.ciphertext,
            iv: self.iv,
            auth_tag: self.auth_tag,
            mime_type: self.mime_type,
            created_at: self.created_at,
        }
    }
}

/// Unique-index violations during create are identifier conflicts, not
/// server errors; the index is the backstop for check-then-insert races
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return AuthError::IdentifierTaken;
        }
    }
    AuthError::Database(err)
}
