use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum AccountRole {
    #[default]
    User = 0,
    Admin = 1,
}

impl AccountRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }

    #[inline]
    pub fn from_id(id: i16) -> AppResult<Self> {
        match id {
            0 => Ok(AccountRole::User),
            1 => Ok(AccountRole::Admin),
            _ => Err(AppError::internal(format!("Invalid AccountRole id: {}", id))),
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> AppResult<Self> {
        match code {
            "user" => Ok(AccountRole::User),
            "admin" => Ok(AccountRole::Admin),
            _ => Err(AppError::internal(format!(
                "Invalid AccountRole code: {}",
                code
            ))),
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
