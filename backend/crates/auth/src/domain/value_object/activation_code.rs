//! Activation Code Value Object
//!
//! One-shot code mailed to a new account. Compared in constant time and
//! cleared from the row once the account is activated.

use platform::crypto::constant_time_eq;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationCode(String);

impl ActivationCode {
    /// Generate a fresh activation code
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Load a stored code from the database
    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Constant-time comparison against a submitted code
    pub fn matches(&self, submitted: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), submitted.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_code_matches() {
        let code = ActivationCode::generate();
        let text = code.as_str().to_string();
        assert!(code.matches(&text));
        assert!(!code.matches("not-the-code"));
    }

    #[test]
    fn test_activation_codes_unique() {
        assert_ne!(
            ActivationCode::generate().as_str(),
            ActivationCode::generate().as_str()
        );
    }
}
