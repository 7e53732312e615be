//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use kernel::id::UserId;
use uuid::Uuid;

use crate::application::activate::{ActivateUseCase, ActivationOutcome};
use crate::application::block::BlockUseCase;
use crate::application::config::AuthConfig;
use crate::application::federated::FederatedLoginUseCase;
use crate::application::login::{LoginInput, LoginOutput, LoginUseCase};
use crate::application::refresh::{RefreshInput, RefreshUseCase};
use crate::application::register::{RegisterInput, RegisterUseCase};
use crate::application::reset_password::ResetPasswordUseCase;
use crate::application::token_codec::AccessTokenCodec;
use crate::application::users::{DEFAULT_PAGE_SIZE, UserQueries};
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::{
    EmailSender, OAuthClient, Provider, RefreshTokenRepository, UserRepository,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ActiveAccountParams, ActiveAccountResponse, EmailUniqueParams, EmailUniqueResponse,
    ListUsersParams, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest, ResetPasswordResponse, SocialAuthUrlResponse, SocialCallbackParams,
    UpdateProfileRequest, UserListResponse, UserResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers
pub struct AuthAppState<R, O, M>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub oauth: Arc<O>,
    pub mailer: Arc<M>,
    pub codec: Arc<AccessTokenCodec>,
    pub config: Arc<AuthConfig>,
}

impl<R, O, M> Clone for AuthAppState<R, O, M>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            oauth: self.oauth.clone(),
            mailer: self.mailer.clone(),
            codec: self.codec.clone(),
            config: self.config.clone(),
        }
    }
}

fn login_response(output: LoginOutput) -> LoginResponse {
    LoginResponse {
        token: output.access_token,
        refresh_token: output.refresh_token.token,
        token_type: RefreshToken::token_type().to_string(),
        username: output.user.username().to_string(),
        roles: output
            .user
            .roles
            .iter()
            .map(|r| r.code().to_string())
            .collect(),
        id: output.user.user_id.to_string(),
    }
}

fn parse_user_id(raw: &str) -> AuthResult<UserId> {
    Uuid::parse_str(raw)
        .map(UserId::from_uuid)
        .map_err(|_| AuthError::Validation("Invalid user id".to_string()))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/v1/users/register
pub async fn register<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            retype_password: req.retype_password,
            roles: req.roles,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_user(&output.user)),
    ))
}

// ============================================================================
// Login / Refresh
// ============================================================================

/// POST /api/v1/users/login
pub async fn login<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.codec.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
            user_agent: user_agent(&headers),
        })
        .await?;

    Ok(Json(login_response(output)))
}

/// POST /api/v1/users/refresh-token
pub async fn refresh_token<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Json(req): Json<RefreshTokenRequest>,
) -> AuthResult<Json<RefreshTokenResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let use_case = RefreshUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.codec.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RefreshInput {
            refresh_token: req.refresh_token,
        })
        .await?;

    Ok(Json(RefreshTokenResponse {
        token: output.access_token,
        refresh_token: output.refresh_token.token,
        token_type: RefreshToken::token_type().to_string(),
    }))
}

// ============================================================================
// Account Lifecycle
// ============================================================================

/// GET /api/v1/users/active-account?email=...&active-code=...
///
/// A code mismatch is a 400 with status 0 in the body; the other two
/// outcomes are 200.
pub async fn active_account<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Query(params): Query<ActiveAccountParams>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let use_case = ActivateUseCase::new(state.repo.clone());
    let outcome = use_case.execute(&params.email, &params.active_code).await?;

    let status = match outcome {
        ActivationOutcome::Mismatch => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    };

    Ok((
        status,
        Json(ActiveAccountResponse {
            status: outcome.status(),
        }),
    ))
}

/// GET /api/v1/users/email-unique?email=...
pub async fn email_unique<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Query(params): Query<EmailUniqueParams>,
) -> AuthResult<Json<EmailUniqueResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let queries = UserQueries::new(state.repo.clone());
    let unique = queries.email_unique(&params.email).await?;

    Ok(Json(EmailUniqueResponse { unique }))
}

/// PUT /api/v1/users/reset-password/{id}
///
/// Admins may reset anyone; a user may reset only their own password.
pub async fn reset_password<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AuthResult<Json<ResetPasswordResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;

    if !current.is_admin() && current.user_id != user_id {
        return Err(AuthError::InsufficientRole);
    }

    let use_case = ResetPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(&user_id).await?;

    Ok(Json(ResetPasswordResponse {
        password: output.new_password.reveal().to_string(),
    }))
}

/// PUT /api/v1/users/block/{id}/{active}
///
/// Admin only (enforced by the access policy).
pub async fn block_or_enable<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Path((id, active)): Path<(String, bool)>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;

    let use_case = BlockUseCase::new(state.repo.clone());
    let user = use_case.execute(&user_id, active).await?;

    Ok(Json(UserResponse::from_user(&user)))
}

// ============================================================================
// Users
// ============================================================================

/// GET /api/v1/users?keyword=...&page=...&limit=...
///
/// Admin only (enforced by the access policy).
pub async fn list_users<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Query(params): Query<ListUsersParams>,
) -> AuthResult<Json<UserListResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let queries = UserQueries::new(state.repo.clone());

    let per_page = params
        .limit
        .filter(|&limit| limit > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let page = queries
        .list(params.keyword.as_deref(), params.page, per_page)
        .await?;

    let total_pages = page.total.div_ceil(per_page);

    Ok(Json(UserListResponse {
        total_pages,
        total: page.total,
        users: page.users.iter().map(UserResponse::from_user).collect(),
    }))
}

/// GET /api/v1/users/details
pub async fn user_details<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Extension(current): Extension<CurrentUser>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let queries = UserQueries::new(state.repo.clone());
    let user = queries.by_id(&current.user_id).await?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// PUT /api/v1/users/{id}
///
/// Admins may edit anyone; a user may edit only their own profile.
pub async fn update_profile<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;

    if !current.is_admin() && current.user_id != user_id {
        return Err(AuthError::InsufficientRole);
    }

    let queries = UserQueries::new(state.repo.clone());
    let user = queries
        .update_profile(&user_id, req.first_name, req.last_name)
        .await?;

    Ok(Json(UserResponse::from_user(&user)))
}

// ============================================================================
// Federated Login
// ============================================================================

fn parse_provider(raw: &str) -> AuthResult<Provider> {
    Provider::from_str(raw)
        .ok_or_else(|| AuthError::Validation(format!("Unknown provider: {}", raw)))
}

fn federated_use_case<R, O, M>(
    state: &AuthAppState<R, O, M>,
) -> FederatedLoginUseCase<R, R, O>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let login = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.codec.clone(),
        state.config.clone(),
    );
    FederatedLoginUseCase::new(
        state.repo.clone(),
        state.oauth.clone(),
        login,
        state.config.clone(),
    )
}

/// GET /api/v1/auth/social-login/{provider}
pub async fn social_auth_url<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    Path(provider): Path<String>,
) -> AuthResult<Json<SocialAuthUrlResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let provider = parse_provider(&provider)?;
    let url = federated_use_case(&state).authorization_url(provider)?;

    Ok(Json(SocialAuthUrlResponse { url }))
}

/// GET /api/v1/auth/social/callback/{provider}?code=...
pub async fn social_callback<R, O, M>(
    State(state): State<AuthAppState<R, O, M>>,
    headers: HeaderMap,
    Path(provider): Path<String>,
    Query(params): Query<SocialCallbackParams>,
) -> AuthResult<Json<LoginResponse>>
where
    R: UserRepository + RefreshTokenRepository + Clone + Send + Sync + 'static,
    O: OAuthClient + Send + Sync + 'static,
    M: EmailSender + Send + Sync + 'static,
{
    let provider = parse_provider(&provider)?;

    let output = federated_use_case(&state)
        .execute(provider, &params.code, user_agent(&headers).as_deref())
        .await?;

    Ok(Json(login_response(output)))
}
