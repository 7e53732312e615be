//! Auth Routers
//!
//! Two route groups: `/users` for accounts and credentials, `/auth` for
//! the federated login endpoints. The access filter is layered by the
//! binary so it covers every API route, not just these.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::domain::repository::{EmailSender, OAuthClient, RefreshTokenRepository, UserRepository};
use crate::infra::mailer::TracingMailer;
use crate::infra::oauth::HttpOAuthClient;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Concrete state used by the binary
pub type PgAuthAppState = AuthAppState<PgAuthRepository, HttpOAuthClient, TracingMailer>;

/// `/users` routes with the PostgreSQL repository
pub fn users_router(state: PgAuthAppState) -> Router {
    users_router_generic(state)
}

/// `/auth` routes with the PostgreSQL repository
pub fn social_router(state: PgAuthAppState) -> Router {
    social_router_generic(state)
}

/// `/users` routes for any implementation set
pub fn users_router_generic<R, O, M>(state: AuthAppState<R, O, M>) -> Router
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    Router::new()
        .route("/register", post(handlers::register::<R, O, M>))
        .route("/login", post(handlers::login::<R, O, M>))
        .route("/refresh-token", post(handlers::refresh_token::<R, O, M>))
        .route("/active-account", get(handlers::active_account::<R, O, M>))
        .route("/email-unique", get(handlers::email_unique::<R, O, M>))
        .route(
            "/reset-password/{id}",
            put(handlers::reset_password::<R, O, M>),
        )
        .route(
            "/block/{id}/{active}",
            put(handlers::block_or_enable::<R, O, M>),
        )
        .route("/details", get(handlers::user_details::<R, O, M>))
        .route("/", get(handlers::list_users::<R, O, M>))
        .route("/{id}", put(handlers::update_profile::<R, O, M>))
        .with_state(state)
}

/// `/auth` routes for any implementation set
pub fn social_router_generic<R, O, M>(state: AuthAppState<R, O, M>) -> Router
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/social-login/{provider}",
            get(handlers::social_auth_url::<R, O, M>),
        )
        .route(
            "/social/callback/{provider}",
            get(handlers::social_callback::<R, O, M>),
        )
        .with_state(state)
}
