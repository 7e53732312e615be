//! Federated Login Use Case
//!
//! Exchanges a provider authorization code for a local account and tokens.
//! Resolution order: linked provider id, then merge by email, then create
//! a fresh active account with a random password.

use std::sync::Arc;

use platform::client::DeviceClass;

use crate::application::config::AuthConfig;
use crate::application::login::{LoginOutput, LoginUseCase};
use crate::domain::entity::user::User;
use crate::domain::repository::{
    OAuthClient, Provider, ProviderProfile, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::AuthResult;

/// Federated login use case
pub struct FederatedLoginUseCase<U, T, O>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    O: OAuthClient,
{
    user_repo: Arc<U>,
    oauth: Arc<O>,
    login: LoginUseCase<U, T>,
    config: Arc<AuthConfig>,
}

impl<U, T, O> FederatedLoginUseCase<U, T, O>
where
    U: UserRepository,
    T: RefreshTokenRepository,
    O: OAuthClient,
{
    pub fn new(
        user_repo: Arc<U>,
        oauth: Arc<O>,
        login: LoginUseCase<U, T>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            oauth,
            login,
            config,
        }
    }

    /// Consent URL for the front end to redirect to
    pub fn authorization_url(&self, provider: Provider) -> AuthResult<String> {
        self.oauth.authorization_url(provider)
    }

    pub async fn execute(
        &self,
        provider: Provider,
        code: &str,
        user_agent: Option<&str>,
    ) -> AuthResult<LoginOutput> {
        let profile = self.oauth.fetch_profile(provider, code).await?;
        let user = self.resolve_account(profile).await?;

        let device = DeviceClass::from_user_agent(user_agent);
        self.login.issue_tokens(user, device).await
    }

    async fn resolve_account(&self, profile: ProviderProfile) -> AuthResult<User> {
        // 1. Already linked
        if let Some(user) = self
            .user_repo
            .find_by_provider(profile.provider, &profile.account_id)
            .await?
        {
            return Ok(user);
        }

        // 2. Merge: same email already registered locally
        if let Some(mut user) = self.user_repo.find_by_email(&profile.email).await? {
            match profile.provider {
                Provider::Google => user.link_google(profile.account_id),
                Provider::Facebook => user.link_facebook(profile.account_id),
            }
            self.user_repo.update(&user).await?;
            tracing::info!(user_id = %user.user_id, provider = profile.provider.as_str(), "Provider linked to existing account");
            return Ok(user);
        }

        // 3. Fresh account. The provider verified the email, so the
        // account starts active; the random password is never disclosed.
        let generated = self.config.password_spec.generate();
        let raw = RawPassword::from_generated(generated);
        let password = UserPassword::from_raw(&raw, self.config.pepper())?;

        let mut user = User::new_federated(profile.email, password);
        user.set_names(profile.given_name, profile.family_name);
        match profile.provider {
            Provider::Google => user.link_google(profile.account_id),
            Provider::Facebook => user.link_facebook(profile.account_id),
        }

        self.user_repo.create(&user).await?;
        tracing::info!(user_id = %user.user_id, provider = profile.provider.as_str(), "Federated account created");

        Ok(user)
    }
}
