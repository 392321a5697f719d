//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod current_account;
pub mod login;
pub mod logout;
pub mod mfa_setup;
pub mod profile_image;
pub mod refresh;
pub mod register;
pub mod tokens;

// Re-exports
pub use config::AuthConfig;
pub use current_account::CurrentAccountUseCase;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use mfa_setup::{MfaSetupOutput, MfaSetupUseCase, MfaVerifyOutput};
pub use profile_image::{ImageUrlOutput, ProfileImageUseCase, ServedImage};
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use tokens::{ImageClaims, SessionClaims, TokenPair, TokenService};
