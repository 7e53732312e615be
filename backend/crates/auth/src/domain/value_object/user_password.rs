//! User Password Value Object
//!
//! Thin domain wrapper around the platform hashing primitives. The stored
//! form is always an Argon2id PHC string; clear text never reaches the
//! entity layer.

use platform::password::{ClearTextPassword, HashedPassword};

use crate::error::AuthResult;

/// Validated clear-text password from a request
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a submitted password against the platform policy
    pub fn new(raw: String) -> AuthResult<Self> {
        Ok(Self(ClearTextPassword::new(raw)?))
    }

    /// Wrap an already-generated password (administrative resets)
    pub fn from_generated(password: ClearTextPassword) -> Self {
        Self(password)
    }

    pub fn as_clear_text(&self) -> &ClearTextPassword {
        &self.0
    }

    pub fn into_clear_text(self) -> ClearTextPassword {
        self.0
    }
}

/// Stored password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a validated clear-text password
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        Ok(Self(raw.as_clear_text().hash(pepper)?))
    }

    /// Load a stored PHC string from the database
    pub fn from_phc_string(phc: impl Into<String>) -> AuthResult<Self> {
        Ok(Self(HashedPassword::from_phc_string(phc)?))
    }

    /// Verify a submitted password against this hash
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.as_clear_text(), pepper)
    }

    /// PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }
}
