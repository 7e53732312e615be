//! Crate-level integration tests
//!
//! Exercises the use cases end to end against an in-memory store, plus
//! the token codec, error mapping, DTO wire shapes and the access filter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use kernel::id::UserId;
use uuid::Uuid;

use crate::application::activate::{ActivateUseCase, ActivationOutcome};
use crate::application::block::BlockUseCase;
use crate::application::config::AuthConfig;
use crate::application::federated::FederatedLoginUseCase;
use crate::application::login::{LoginInput, LoginUseCase};
use crate::application::refresh::{RefreshInput, RefreshUseCase};
use crate::application::register::{RegisterInput, RegisterUseCase};
use crate::application::reset_password::ResetPasswordUseCase;
use crate::application::token_codec::{AccessTokenCodec, TokenError};
use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{
    EmailSender, OAuthClient, Provider, ProviderProfile, RefreshTokenRepository, UserPage,
    UserRepository,
};
use crate::domain::value_object::{email::Email, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// In-memory test doubles
// ============================================================================

/// In-memory implementation of both repositories
#[derive(Clone, Default)]
struct MemoryAuthStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    tokens: Arc<Mutex<HashMap<String, RefreshToken>>>,
}

impl UserRepository for MemoryAuthStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id.into_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(user_id.as_uuid()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|u| u.email == *email))
    }

    async fn find_by_provider(
        &self,
        provider: Provider,
        account_id: &str,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| match provider {
                Provider::Google => u.google_account_id.as_deref() == Some(account_id),
                Provider::Facebook => u.facebook_account_id.as_deref() == Some(account_id),
            })
            .cloned())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        self.users
            .lock()
            .unwrap()
            .insert(user.user_id.into_uuid(), user.clone());
        Ok(())
    }

    async fn list(&self, keyword: Option<&str>, page: u64, per_page: u64) -> AuthResult<UserPage> {
        let users = self.users.lock().unwrap();
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| {
                keyword
                    .map(|k| u.email.as_str().contains(&k.to_lowercase()))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.email.as_str().cmp(b.email.as_str()));

        let total = matching.len() as u64;
        let users = matching
            .into_iter()
            .skip((page * per_page) as usize)
            .take(per_page as usize)
            .collect();

        Ok(UserPage { users, total })
    }
}

impl RefreshTokenRepository for MemoryAuthStore {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn rotate(&self, presented: &str, replacement: &RefreshToken) -> AuthResult<()> {
        // The mutex plays the role of the database row lock
        let mut tokens = self.tokens.lock().unwrap();

        let current = tokens
            .get_mut(presented)
            .ok_or(AuthError::RefreshTokenNotFound)?;
        if current.revoked {
            return Err(AuthError::RefreshTokenRevoked);
        }
        if current.is_expired() {
            current.expired = true;
            return Err(AuthError::RefreshTokenExpired);
        }

        current.revoked = true;
        tokens.insert(replacement.token.clone(), replacement.clone());
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != *user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        let now = Utc::now();
        tokens.retain(|_, t| t.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }
}

/// Mailer that records what it was asked to send
#[derive(Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl EmailSender for RecordingMailer {
    async fn send(&self, to: &Email, subject: &str, _body: &str) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// OAuth client that returns one canned profile
#[derive(Clone)]
struct StubOAuthClient {
    profile: ProviderProfile,
}

impl OAuthClient for StubOAuthClient {
    fn authorization_url(&self, provider: Provider) -> AuthResult<String> {
        Ok(format!("https://consent.example/{}", provider.as_str()))
    }

    async fn fetch_profile(&self, provider: Provider, code: &str) -> AuthResult<ProviderProfile> {
        if code != "good-code" {
            return Err(AuthError::Provider("bad code".to_string()));
        }
        let mut profile = self.profile.clone();
        profile.provider = provider;
        Ok(profile)
    }
}

// ============================================================================
// Shared fixtures
// ============================================================================

struct Fixture {
    store: Arc<MemoryAuthStore>,
    mailer: Arc<RecordingMailer>,
    codec: Arc<AccessTokenCodec>,
    config: Arc<AuthConfig>,
}

impl Fixture {
    fn new() -> Self {
        let config = Arc::new(AuthConfig::with_random_secret());
        Self {
            store: Arc::new(MemoryAuthStore::default()),
            mailer: Arc::new(RecordingMailer::default()),
            codec: Arc::new(AccessTokenCodec::new(&config)),
            config,
        }
    }

    fn register(&self) -> RegisterUseCase<MemoryAuthStore, RecordingMailer> {
        RegisterUseCase::new(self.store.clone(), self.mailer.clone(), self.config.clone())
    }

    fn login(&self) -> LoginUseCase<MemoryAuthStore, MemoryAuthStore> {
        LoginUseCase::new(
            self.store.clone(),
            self.store.clone(),
            self.codec.clone(),
            self.config.clone(),
        )
    }

    fn refresh(&self) -> RefreshUseCase<MemoryAuthStore, MemoryAuthStore> {
        RefreshUseCase::new(
            self.store.clone(),
            self.store.clone(),
            self.codec.clone(),
            self.config.clone(),
        )
    }

    async fn register_user(&self, email: &str, password: &str) -> User {
        self.register()
            .execute(RegisterInput {
                email: email.to_string(),
                password: password.to_string(),
                retype_password: password.to_string(),
                roles: vec![],
                first_name: Some("Test".to_string()),
                last_name: None,
            })
            .await
            .unwrap()
            .user
    }

    async fn register_active_user(&self, email: &str, password: &str) -> User {
        let user = self.register_user(email, password).await;
        let code = user.activation_code.as_ref().unwrap().as_str().to_string();
        ActivateUseCase::new(self.store.clone())
            .execute(email, &code)
            .await
            .unwrap();
        self.store
            .find_by_id(&user.user_id)
            .await
            .unwrap()
            .unwrap()
    }
}

const PASSWORD: &str = "CorrectHorse9!";

// ============================================================================
// Registration and activation
// ============================================================================

mod register_tests {
    use super::*;

    #[tokio::test]
    async fn new_account_is_inactive_and_mailed() {
        let fx = Fixture::new();
        let user = fx.register_user("alice@example.com", PASSWORD).await;

        assert!(!user.active);
        assert!(user.activation_code.is_some());
        assert_eq!(user.roles, vec![UserRole::User]);

        let sent = fx.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let fx = Fixture::new();
        fx.register_user("alice@example.com", PASSWORD).await;

        let result = fx
            .register()
            .execute(RegisterInput {
                email: "Alice@Example.com".to_string(),
                password: PASSWORD.to_string(),
                retype_password: PASSWORD.to_string(),
                roles: vec![],
                first_name: None,
                last_name: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn admin_self_registration_rejected() {
        let fx = Fixture::new();
        let result = fx
            .register()
            .execute(RegisterInput {
                email: "eve@example.com".to_string(),
                password: PASSWORD.to_string(),
                retype_password: PASSWORD.to_string(),
                roles: vec!["ROLE_ADMIN".to_string()],
                first_name: None,
                last_name: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::AdminRegistration)));
    }

    #[tokio::test]
    async fn password_mismatch_rejected() {
        let fx = Fixture::new();
        let result = fx
            .register()
            .execute(RegisterInput {
                email: "bob@example.com".to_string(),
                password: PASSWORD.to_string(),
                retype_password: "SomethingElse1!".to_string(),
                roles: vec![],
                first_name: None,
                last_name: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::PasswordMismatch)));
    }

    #[tokio::test]
    async fn activation_statuses() {
        let fx = Fixture::new();
        let user = fx.register_user("alice@example.com", PASSWORD).await;
        let code = user.activation_code.as_ref().unwrap().as_str().to_string();
        let activate = ActivateUseCase::new(fx.store.clone());

        // Wrong code first
        let outcome = activate
            .execute("alice@example.com", "wrong-code")
            .await
            .unwrap();
        assert_eq!(outcome, ActivationOutcome::Mismatch);
        assert_eq!(outcome.status(), 0);

        // Right code activates
        let outcome = activate.execute("alice@example.com", &code).await.unwrap();
        assert_eq!(outcome, ActivationOutcome::Activated);
        assert_eq!(outcome.status(), 2);

        // Second attempt is idempotent
        let outcome = activate.execute("alice@example.com", &code).await.unwrap();
        assert_eq!(outcome, ActivationOutcome::AlreadyActive);
        assert_eq!(outcome.status(), 1);
    }

    #[tokio::test]
    async fn activation_mismatch_is_bad_request_over_http() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        use crate::presentation::handlers::AuthAppState;
        use crate::presentation::router::users_router_generic;

        let fx = Fixture::new();
        let user = fx.register_user("alice@example.com", PASSWORD).await;
        let code = user.activation_code.as_ref().unwrap().as_str().to_string();

        let state = AuthAppState {
            repo: fx.store.clone(),
            oauth: Arc::new(StubOAuthClient {
                profile: ProviderProfile {
                    provider: Provider::Google,
                    account_id: "unused".to_string(),
                    email: Email::new("unused@example.com").unwrap(),
                    given_name: None,
                    family_name: None,
                },
            }),
            mailer: fx.mailer.clone(),
            codec: fx.codec.clone(),
            config: fx.config.clone(),
        };
        let app = users_router_generic(state);

        let get = |uri: String| {
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(get(
                "/active-account?email=alice%40example.com&active-code=wrong".to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get(format!(
                "/active-account?email=alice%40example.com&active-code={code}"
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// ============================================================================
// Login and refresh
// ============================================================================

mod login_tests {
    use super::*;

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: password.to_string(),
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn inactive_account_cannot_login() {
        let fx = Fixture::new();
        fx.register_user("alice@example.com", PASSWORD).await;

        let result = fx
            .login()
            .execute(login_input("alice@example.com", PASSWORD))
            .await;
        assert!(matches!(result, Err(AuthError::AccountDisabled)));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_identical() {
        let fx = Fixture::new();
        fx.register_active_user("alice@example.com", PASSWORD).await;

        let unknown = fx
            .login()
            .execute(login_input("nobody@example.com", PASSWORD))
            .await;
        let wrong = fx
            .login()
            .execute(login_input("alice@example.com", "WrongPass123!"))
            .await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn successful_login_issues_verifiable_token() {
        let fx = Fixture::new();
        fx.register_active_user("alice@example.com", PASSWORD).await;

        let output = fx
            .login()
            .execute(login_input("alice@example.com", PASSWORD))
            .await
            .unwrap();

        let verified = fx.codec.verify(&output.access_token).unwrap();
        assert_eq!(verified.subject, "alice@example.com");
        assert_eq!(verified.roles, vec![UserRole::User]);
        assert!(!output.refresh_token.mobile);
    }

    #[tokio::test]
    async fn mobile_user_agent_gets_mobile_token() {
        let fx = Fixture::new();
        fx.register_active_user("alice@example.com", PASSWORD).await;

        let output = fx
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: PASSWORD.to_string(),
                user_agent: Some("ShopApp/2.1 (Android 14) Mobile".to_string()),
            })
            .await
            .unwrap();

        assert!(output.refresh_token.mobile);
        // Mobile tokens outlive web tokens
        let web_ttl = fx.config.refresh_ttl(false);
        let mobile_ttl = fx.config.refresh_ttl(true);
        assert!(mobile_ttl > web_ttl);
    }

    #[tokio::test]
    async fn refresh_rotates_exactly_once() {
        let fx = Fixture::new();
        fx.register_active_user("alice@example.com", PASSWORD).await;

        let login = fx
            .login()
            .execute(login_input("alice@example.com", PASSWORD))
            .await
            .unwrap();
        let first = login.refresh_token.token.clone();

        let refreshed = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: first.clone(),
            })
            .await
            .unwrap();
        assert_ne!(refreshed.refresh_token.token, first);

        // Replaying the consumed token fails
        let replay = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: first,
            })
            .await;
        assert!(matches!(replay, Err(AuthError::RefreshTokenRevoked)));

        // The replacement still works
        let again = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: refreshed.refresh_token.token,
            })
            .await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn concurrent_refresh_succeeds_at_most_once() {
        let fx = Fixture::new();
        fx.register_active_user("alice@example.com", PASSWORD).await;

        let login = fx
            .login()
            .execute(login_input("alice@example.com", PASSWORD))
            .await
            .unwrap();
        let token = login.refresh_token.token;

        let refresh_a = fx.refresh();
        let refresh_b = fx.refresh();
        let a = refresh_a.execute(RefreshInput {
            refresh_token: token.clone(),
        });
        let b = refresh_b.execute(RefreshInput {
            refresh_token: token,
        });

        let (a, b) = tokio::join!(a, b);
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|&&ok| ok).count();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn expired_refresh_token_rejected() {
        let fx = Fixture::new();
        let user = fx.register_active_user("alice@example.com", PASSWORD).await;

        let mut stale = RefreshToken::new(user.user_id, false, chrono::Duration::days(30));
        stale.expires_at = Utc::now() - chrono::Duration::seconds(1);
        RefreshTokenRepository::create(fx.store.as_ref(), &stale)
            .await
            .unwrap();

        let result = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: stale.token,
            })
            .await;
        assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));
    }
}

// ============================================================================
// Reset, block, admin flows
// ============================================================================

mod account_admin_tests {
    use super::*;

    #[tokio::test]
    async fn reset_password_revokes_tokens_and_rotates_credential() {
        let fx = Fixture::new();
        let user = fx.register_active_user("alice@example.com", PASSWORD).await;

        let login = fx
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: PASSWORD.to_string(),
                user_agent: None,
            })
            .await
            .unwrap();

        let reset = ResetPasswordUseCase::new(
            fx.store.clone(),
            fx.store.clone(),
            fx.mailer.clone(),
            fx.config.clone(),
        );
        let output = reset.execute(&user.user_id).await.unwrap();
        let new_password = output.new_password.reveal().to_string();

        // Old refresh token is gone
        let replay = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: login.refresh_token.token,
            })
            .await;
        assert!(matches!(replay, Err(AuthError::RefreshTokenNotFound)));

        // Old password no longer works, the generated one does
        let old = fx
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: PASSWORD.to_string(),
                user_agent: None,
            })
            .await;
        assert!(matches!(old, Err(AuthError::InvalidCredentials)));

        let fresh = fx
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: new_password.clone(),
                user_agent: None,
            })
            .await;
        assert!(fresh.is_ok());

        // Generated password honors the configured composition
        let spec = &fx.config.password_spec;
        assert_eq!(new_password.chars().count(), spec.total_length());
    }

    #[tokio::test]
    async fn reset_password_unknown_user() {
        let fx = Fixture::new();
        let reset = ResetPasswordUseCase::new(
            fx.store.clone(),
            fx.store.clone(),
            fx.mailer.clone(),
            fx.config.clone(),
        );
        let result = reset.execute(&UserId::new()).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn block_disables_refresh_without_revoking() {
        let fx = Fixture::new();
        let user = fx.register_active_user("alice@example.com", PASSWORD).await;

        let login = fx
            .login()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: PASSWORD.to_string(),
                user_agent: None,
            })
            .await
            .unwrap();
        let token = login.refresh_token.token;

        let block = BlockUseCase::new(fx.store.clone());
        let blocked = block.execute(&user.user_id, false).await.unwrap();
        assert!(!blocked.active);

        // Ledger row survives, but redemption is refused
        assert!(
            RefreshTokenRepository::find_by_token(fx.store.as_ref(), &token)
                .await
                .unwrap()
                .is_some()
        );
        let refused = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: token.clone(),
            })
            .await;
        assert!(matches!(refused, Err(AuthError::AccountDisabled)));

        // Re-enabling restores the session
        block.execute(&user.user_id, true).await.unwrap();
        let restored = fx
            .refresh()
            .execute(RefreshInput {
                refresh_token: token,
            })
            .await;
        assert!(restored.is_ok());
    }
}

// ============================================================================
// Federated login
// ============================================================================

mod federated_tests {
    use super::*;

    fn stub_profile(email: &str) -> ProviderProfile {
        ProviderProfile {
            provider: Provider::Google,
            account_id: "google-123".to_string(),
            email: Email::new(email).unwrap(),
            given_name: Some("Alice".to_string()),
            family_name: Some("Liddell".to_string()),
        }
    }

    fn federated(
        fx: &Fixture,
        profile: ProviderProfile,
    ) -> FederatedLoginUseCase<MemoryAuthStore, MemoryAuthStore, StubOAuthClient> {
        FederatedLoginUseCase::new(
            fx.store.clone(),
            Arc::new(StubOAuthClient { profile }),
            fx.login(),
            fx.config.clone(),
        )
    }

    #[tokio::test]
    async fn first_login_creates_active_account() {
        let fx = Fixture::new();
        let use_case = federated(&fx, stub_profile("alice@example.com"));

        let output = use_case
            .execute(Provider::Google, "good-code", None)
            .await
            .unwrap();

        assert!(output.user.active);
        assert!(output.user.activation_code.is_none());
        assert_eq!(output.user.google_account_id.as_deref(), Some("google-123"));
        assert_eq!(output.user.first_name.as_deref(), Some("Alice"));

        let verified = fx.codec.verify(&output.access_token).unwrap();
        assert_eq!(verified.subject, "alice@example.com");
    }

    #[tokio::test]
    async fn second_login_reuses_linked_account() {
        let fx = Fixture::new();
        let use_case = federated(&fx, stub_profile("alice@example.com"));

        let first = use_case
            .execute(Provider::Google, "good-code", None)
            .await
            .unwrap();
        let second = use_case
            .execute(Provider::Google, "good-code", None)
            .await
            .unwrap();

        assert_eq!(first.user.user_id, second.user.user_id);
        assert_eq!(fx.store.users.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn matching_email_links_existing_account() {
        let fx = Fixture::new();
        let existing = fx.register_active_user("alice@example.com", PASSWORD).await;

        let use_case = federated(&fx, stub_profile("alice@example.com"));
        let output = use_case
            .execute(Provider::Google, "good-code", None)
            .await
            .unwrap();

        assert_eq!(output.user.user_id, existing.user_id);
        assert_eq!(output.user.google_account_id.as_deref(), Some("google-123"));
    }

    #[tokio::test]
    async fn bad_code_is_provider_error() {
        let fx = Fixture::new();
        let use_case = federated(&fx, stub_profile("alice@example.com"));

        let result = use_case.execute(Provider::Google, "bad-code", None).await;
        assert!(matches!(result, Err(AuthError::Provider(_))));
    }
}

// ============================================================================
// Token codec
// ============================================================================

mod token_codec_tests {
    use super::*;
    use crate::application::token_codec::Claims;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    #[test]
    fn issue_and_verify_roundtrip() {
        let config = AuthConfig::with_random_secret();
        let codec = AccessTokenCodec::new(&config);

        let token = codec
            .issue("alice@example.com", &[UserRole::User, UserRole::Admin])
            .unwrap();
        let verified = codec.verify(&token).unwrap();

        assert_eq!(verified.subject, "alice@example.com");
        assert_eq!(verified.roles, vec![UserRole::User, UserRole::Admin]);
        assert!(verified.expires_at > Utc::now());
    }

    #[test]
    fn foreign_signature_rejected() {
        let config = AuthConfig::with_random_secret();
        let other = AuthConfig::with_random_secret();

        let token = AccessTokenCodec::new(&other)
            .issue("alice@example.com", &[UserRole::User])
            .unwrap();

        let result = AccessTokenCodec::new(&config).verify(&token);
        assert_eq!(result.unwrap_err(), TokenError::SignatureMismatch);
    }

    #[test]
    fn garbage_is_malformed() {
        let config = AuthConfig::with_random_secret();
        let codec = AccessTokenCodec::new(&config);
        assert_eq!(codec.verify("not.a.jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(codec.verify("").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn expired_token_rejected_but_subject_recoverable() {
        let config = AuthConfig::with_random_secret();
        let codec = AccessTokenCodec::new(&config);

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            roles: vec!["ROLE_USER".to_string()],
            iat: now - 7200,
            exp: now - 3600,
        };
        let stale = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&config.token_secret),
        )
        .unwrap();

        assert_eq!(codec.verify(&stale).unwrap_err(), TokenError::Expired);
        assert_eq!(
            codec.extract_subject(&stale).as_deref(),
            Some("alice@example.com")
        );
    }
}

// ============================================================================
// Error mapping
// ============================================================================

mod error_tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::TokenInvalid.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::RefreshTokenRevoked.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountDisabled.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InsufficientRole.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::EmailTaken.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::PasswordMismatch.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Provider("boom".to_string())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn refresh_failures_collapse_for_clients() {
        // All three ledger failures present the same message
        let not_found = AuthError::RefreshTokenNotFound.to_app_error();
        let revoked = AuthError::RefreshTokenRevoked.to_app_error();
        let expired = AuthError::RefreshTokenExpired.to_app_error();
        assert_eq!(not_found.message(), revoked.message());
        assert_eq!(revoked.message(), expired.message());
    }
}

// ============================================================================
// DTO wire shapes
// ============================================================================

mod dto_tests {
    use crate::presentation::dto::{
        ActiveAccountParams, LoginResponse, RefreshTokenRequest, RegisterRequest,
    };

    #[test]
    fn login_response_is_camel_case() {
        let response = LoginResponse {
            token: "jwt".to_string(),
            refresh_token: "opaque".to_string(),
            token_type: "Bearer".to_string(),
            username: "alice@example.com".to_string(),
            roles: vec!["ROLE_USER".to_string()],
            id: "id".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refreshToken"], "opaque");
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["roles"][0], "ROLE_USER");
    }

    #[test]
    fn register_request_accepts_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{
                "email": "alice@example.com",
                "password": "CorrectHorse9!",
                "retypePassword": "CorrectHorse9!",
                "firstName": "Alice",
                "lastName": null
            }"#,
        )
        .unwrap();

        assert_eq!(req.retype_password, "CorrectHorse9!");
        assert_eq!(req.first_name.as_deref(), Some("Alice"));
        assert!(req.roles.is_empty());
    }

    #[test]
    fn activation_params_use_dashed_code_key() {
        let params: ActiveAccountParams = serde_urlencoded_from_str(
            "email=alice%40example.com&active-code=abc-123",
        );
        assert_eq!(params.email, "alice@example.com");
        assert_eq!(params.active_code, "abc-123");
    }

    #[test]
    fn refresh_request_accepts_camel_case() {
        let req: RefreshTokenRequest =
            serde_json::from_str(r#"{"refreshToken": "opaque"}"#).unwrap();
        assert_eq!(req.refresh_token, "opaque");
    }

    fn serde_urlencoded_from_str<T: serde::de::DeserializeOwned>(s: &str) -> T {
        serde_urlencoded::from_str(s).unwrap()
    }
}

// ============================================================================
// Access filter
// ============================================================================

mod access_filter_tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    use crate::presentation::middleware::{AccessFilterState, CurrentUser, access_filter};
    use crate::presentation::policy::AccessPolicy;

    async fn whoami(Extension(current): Extension<CurrentUser>) -> String {
        current.email.to_string()
    }

    fn app(fx: &Fixture) -> Router {
        let state = AccessFilterState {
            repo: fx.store.clone(),
            codec: fx.codec.clone(),
            policy: Arc::new(AccessPolicy::default()),
        };

        Router::new()
            .route("/api/v1/health", get(|| async { "ok" }))
            .route("/api/v1/products/{id}", get(|| async { "product" }))
            .route("/api/v1/orders", get(whoami))
            .route("/api/v1/users", get(|| async { "admin only" }))
            .layer(middleware::from_fn_with_state(
                state,
                access_filter::<MemoryAuthStore>,
            ))
    }

    fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn bypass_routes_need_no_token() {
        let fx = Fixture::new();
        let app = app(&fx);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("GET", "/api/v1/products/42", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_rejects_missing_and_garbage_tokens() {
        let fx = Fixture::new();
        let app = app(&fx);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/orders", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(request("GET", "/api/v1/orders", Some("garbage")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let fx = Fixture::new();
        fx.register_active_user("alice@example.com", PASSWORD).await;
        let token = fx.codec.issue("alice@example.com", &[UserRole::User]).unwrap();

        let response = app(&fx)
            .oneshot(request("GET", "/api/v1/orders", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn blocked_account_collapses_to_unauthorized() {
        let fx = Fixture::new();
        let user = fx.register_active_user("alice@example.com", PASSWORD).await;
        let token = fx.codec.issue("alice@example.com", &[UserRole::User]).unwrap();

        BlockUseCase::new(fx.store.clone())
            .execute(&user.user_id, false)
            .await
            .unwrap();

        // Indistinguishable from any other rejected token
        let response = app(&fx)
            .oneshot(request("GET", "/api/v1/orders", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_route_enforces_role_from_database() {
        let fx = Fixture::new();
        let mut user = fx.register_active_user("alice@example.com", PASSWORD).await;
        let token = fx.codec.issue("alice@example.com", &[UserRole::User]).unwrap();

        let response = app(&fx)
            .clone()
            .oneshot(request("GET", "/api/v1/users", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Grant the role in storage; the same token now passes
        user.roles.push(UserRole::Admin);
        UserRepository::update(fx.store.as_ref(), &user).await.unwrap();

        let response = app(&fx)
            .oneshot(request("GET", "/api/v1/users", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
