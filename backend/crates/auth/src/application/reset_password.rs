//! Reset Password Use Case
//!
//! Generates a fresh password, stores its hash, drops every refresh token
//! the user holds and mails the new password. The clear text is returned
//! exactly once and never logged.

use std::sync::Arc;

use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::repository::{EmailSender, RefreshTokenRepository, UserRepository};
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

/// Reset password output
pub struct ResetPasswordOutput {
    /// The generated password, for the response body only
    pub new_password: ClearTextPassword,
}

/// Reset password use case
pub struct ResetPasswordUseCase<U, T, M>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    M: EmailSender,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, T, M> ResetPasswordUseCase<U, T, M>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    M: EmailSender,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, user_id: &UserId) -> AuthResult<ResetPasswordOutput> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let generated = self.config.password_spec.generate();
        let raw = RawPassword::from_generated(generated);
        let password = UserPassword::from_raw(&raw, self.config.pepper())?;

        user.set_password(password);
        self.user_repo.update(&user).await?;

        // Every outstanding session loses its refresh path
        let dropped = self.token_repo.revoke_all_for_user(user_id).await?;

        let body = format!(
            "Your password has been reset. New password: {}",
            raw.as_clear_text().reveal()
        );
        if let Err(e) = self
            .mailer
            .send(&user.email, "Your password was reset", &body)
            .await
        {
            tracing::error!(error = %e, user_id = %user.user_id, "Reset mail failed");
        }

        tracing::info!(user_id = %user.user_id, dropped, "Password reset");

        Ok(ResetPasswordOutput {
            new_password: raw.into_clear_text(),
        })
    }
}
