//! Repository and Gateway Traits
//!
//! Interfaces for persistence and outbound services. Implementations live
//! in the infrastructure layer.

use kernel::id::UserId;

use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Federated identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Provider::Google),
            "facebook" => Some(Provider::Facebook),
            _ => None,
        }
    }
}

/// Profile returned by an identity provider after code exchange
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub provider: Provider,
    /// Provider-side account identifier
    pub account_id: String,
    pub email: Email,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Page of users for administrative listing
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    /// Total matching rows, before paging
    pub total: u64,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Find user by linked provider account id
    async fn find_by_provider(
        &self,
        provider: Provider,
        account_id: &str,
    ) -> AuthResult<Option<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Page through users, optionally filtered by an email keyword
    async fn list(&self, keyword: Option<&str>, page: u64, per_page: u64) -> AuthResult<UserPage>;
}

/// Refresh token ledger trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Persist a freshly issued token
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Look up a token row by its opaque string
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Atomically revoke `presented` and persist `replacement`.
    ///
    /// Fails with `RefreshTokenNotFound`, `RefreshTokenRevoked` or
    /// `RefreshTokenExpired`; concurrent redemptions of the same token
    /// must succeed at most once.
    async fn rotate(&self, presented: &str, replacement: &RefreshToken) -> AuthResult<()>;

    /// Drop every token belonging to a user (password reset)
    async fn revoke_all_for_user(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Remove rows past their expiry, returning the count
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}

/// Outbound mail gateway
#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    /// Send a plain-text message. Failures are reported, not retried here.
    async fn send(&self, to: &Email, subject: &str, body: &str) -> AuthResult<()>;
}

/// Identity provider gateway (authorization-code flow)
#[trait_variant::make(OAuthClient: Send)]
pub trait LocalOAuthClient {
    /// URL the client should be redirected to for consent
    fn authorization_url(&self, provider: Provider) -> AuthResult<String>;

    /// Exchange an authorization code for the provider profile
    async fn fetch_profile(&self, provider: Provider, code: &str) -> AuthResult<ProviderProfile>;
}
