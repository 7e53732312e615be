//! Activate Account Use Case
//!
//! Matches a submitted activation code against the account. Idempotent:
//! activating an already-active account reports that, not an error.

use std::sync::Arc;

use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Activation result reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Code did not match (or account has no pending code)
    Mismatch,
    /// Account was already active
    AlreadyActive,
    /// Account has been activated now
    Activated,
}

impl ActivationOutcome {
    /// Wire status code: 0 = mismatch, 1 = already active, 2 = activated
    pub const fn status(&self) -> u8 {
        match self {
            ActivationOutcome::Mismatch => 0,
            ActivationOutcome::AlreadyActive => 1,
            ActivationOutcome::Activated => 2,
        }
    }
}

/// Activate account use case
pub struct ActivateUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ActivateUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, email: &str, code: &str) -> AuthResult<ActivationOutcome> {
        let email = Email::new(email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.active {
            return Ok(ActivationOutcome::AlreadyActive);
        }

        match &user.activation_code {
            Some(pending) if pending.matches(code) => {
                user.activate();
                self.user_repo.update(&user).await?;
                tracing::info!(user_id = %user.user_id, "Account activated");
                Ok(ActivationOutcome::Activated)
            }
            _ => Ok(ActivationOutcome::Mismatch),
        }
    }
}
