//! User Role Value Object
//!
//! Stored and serialized as the wire codes `ROLE_USER` / `ROLE_ADMIN`,
//! which also appear inside access-token claims.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            UserRole::User => "ROLE_USER",
            UserRole::Admin => "ROLE_ADMIN",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Parse a stored role code. Unknown codes are a data error, not a panic.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ROLE_USER" => Some(UserRole::User),
            "ROLE_ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Parse a list of stored role codes, skipping unknown entries with a log.
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        codes
            .into_iter()
            .filter_map(|code| {
                let role = Self::from_code(code);
                if role.is_none() {
                    tracing::error!(code, "Unknown role code in storage");
                }
                role
            })
            .collect()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
