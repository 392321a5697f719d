//! Platform Crate - Technical Infrastructure
//!
//! This crate provides the shared security foundations:
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Signed claim tokens (access / refresh / image-access)
//! - Cookie management with path scoping
//! - CSRF double-submit primitives
//! - Login throttling (sliding window, pluggable store)
//! - Authenticated encryption for at-rest blobs (AES-256-GCM)
//! - Small crypto utilities and client origin extraction

pub mod cipher;
pub mod client;
pub mod cookie;
pub mod crypto;
pub mod csrf;
pub mod password;
pub mod throttle;
pub mod token;
