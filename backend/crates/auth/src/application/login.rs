//! Login Use Case
//!
//! Authenticates credentials and issues an access token plus a refresh
//! token. Unknown email and wrong password collapse into the same error.

use std::sync::Arc;

use platform::client::DeviceClass;

use crate::application::config::AuthConfig;
use crate::application::token_codec::AccessTokenCodec;
use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
    /// User-Agent header, used for device classification
    pub user_agent: Option<String>,
}

/// Login output
pub struct LoginOutput {
    pub user: User,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

/// Login use case
pub struct LoginUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    codec: Arc<AccessTokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, T> LoginUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        codec: Arc<AccessTokenCodec>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            codec,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let raw = RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;
        if !user.password.verify(&raw, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        // Only after the password check, so probing cannot distinguish
        // disabled accounts from bad credentials without knowing the password
        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        let device = DeviceClass::from_user_agent(input.user_agent.as_deref());
        self.issue_tokens(user, device).await
    }

    /// Issue both tokens for an already-authenticated user. Shared with
    /// the federated login flow.
    pub async fn issue_tokens(&self, user: User, device: DeviceClass) -> AuthResult<LoginOutput> {
        let access_token = self.codec.issue(user.username(), &user.roles)?;
        let refresh_token = RefreshToken::new(
            user.user_id,
            device.is_mobile(),
            self.config.refresh_ttl(device.is_mobile()),
        );
        self.token_repo.create(&refresh_token).await?;

        tracing::info!(user_id = %user.user_id, device = %device, "Login succeeded");

        Ok(LoginOutput {
            user,
            access_token,
            refresh_token,
        })
    }
}
