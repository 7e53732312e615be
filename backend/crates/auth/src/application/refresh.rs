//! Refresh Use Case
//!
//! Redeems a refresh token for a new access token, rotating the refresh
//! token atomically. A presented token can be redeemed at most once even
//! under concurrent requests.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_codec::AccessTokenCodec;
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Refresh input
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Refresh output
pub struct RefreshOutput {
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

/// Refresh use case
pub struct RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    codec: Arc<AccessTokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, T> RefreshUseCase<U, T>
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

    pub async fn execute(&self, input: RefreshInput) -> AuthResult<RefreshOutput> {
        let presented = self
            .token_repo
            .find_by_token(&input.refresh_token)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        let user = self
            .user_repo
            .find_by_id(&presented.user_id)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        // The replacement keeps the device class of the presented token
        let replacement = RefreshToken::new(
            user.user_id,
            presented.mobile,
            self.config.refresh_ttl(presented.mobile),
        );

        // The ledger enforces single redemption; revoked/expired checks
        // happen inside the same transaction as the rotation.
        self.token_repo
            .rotate(&input.refresh_token, &replacement)
            .await?;

        let access_token = self.codec.issue(user.username(), &user.roles)?;

        tracing::debug!(user_id = %user.user_id, "Refresh token rotated");

        Ok(RefreshOutput {
            access_token,
            refresh_token: replacement,
        })
    }
}
