//! Value Object Module

pub mod account_id;
pub mod account_password;
pub mod account_role;
pub mod backup_codes;
pub mod email;
pub mod phone;
pub mod public_id;
pub mod totp_secret;
