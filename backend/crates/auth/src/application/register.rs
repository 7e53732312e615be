//! Register Use Case
//!
//! Creates an inactive account and mails the activation code.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::{EmailSender, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub retype_password: String,
    /// Requested roles; `ROLE_ADMIN` is rejected for self-registration
    pub roles: Vec<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Register output
pub struct RegisterOutput {
    pub user: User,
}

/// Register use case
pub struct RegisterUseCase<U, M>
where
    U: UserRepository,
    M: EmailSender,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> RegisterUseCase<U, M>
where
    U: UserRepository,
    M: EmailSender,
{
    pub fn new(user_repo: Arc<U>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        if input.password != input.retype_password {
            return Err(AuthError::PasswordMismatch);
        }

        let email = Email::new(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let mut roles = Vec::with_capacity(input.roles.len());
        for code in &input.roles {
            let role = UserRole::from_code(code)
                .ok_or_else(|| AuthError::Validation(format!("Unknown role: {}", code)))?;
            if role.is_admin() {
                return Err(AuthError::AdminRegistration);
            }
            roles.push(role);
        }

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let raw = RawPassword::new(input.password)?;
        let password = UserPassword::from_raw(&raw, self.config.pepper())?;

        let mut user = User::new(email, password, roles);
        user.set_names(input.first_name, input.last_name);

        self.user_repo.create(&user).await?;

        // Activation mail failure does not roll back the account; the code
        // can be re-sent out of band.
        if let Some(code) = &user.activation_code {
            let body = format!(
                "Welcome! Activate your account with this code: {}",
                code.as_str()
            );
            if let Err(e) = self
                .mailer
                .send(&user.email, "Activate your account", &body)
                .await
            {
                tracing::error!(error = %e, user_id = %user.user_id, "Activation mail failed");
            }
        }

        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(RegisterOutput { user })
    }
}
