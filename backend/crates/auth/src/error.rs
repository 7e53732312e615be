//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Self-registration with an admin role is rejected
    #[error("Cannot self-register an administrator account")]
    AdminRegistration,

    /// Invalid credentials (unknown email or wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is disabled (blocked or not yet activated)
    #[error("Account is disabled")]
    AccountDisabled,

    /// Authenticated but lacking the required role
    #[error("Insufficient role for this resource")]
    InsufficientRole,

    /// Bearer token missing, malformed, tampered or expired
    #[error("Invalid or expired access token")]
    TokenInvalid,

    /// Refresh token unknown
    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    /// Refresh token already rotated or revoked
    #[error("Refresh token revoked")]
    RefreshTokenRevoked,

    /// Refresh token past its expiry
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// Password and confirmation do not match
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Request validation error
    #[error("Validation failed: {0}")]
    Validation(String),

    /// OAuth provider error (network, token exchange, profile fetch)
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailTaken | AuthError::AdminRegistration => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::RefreshTokenNotFound
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired
            | AuthError::Provider(_) => StatusCode::UNAUTHORIZED,
            AuthError::AccountDisabled | AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::PasswordMismatch | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken | AuthError::AdminRegistration => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::RefreshTokenNotFound
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired
            | AuthError::Provider(_) => ErrorKind::Unauthorized,
            AuthError::AccountDisabled | AuthError::InsufficientRole => ErrorKind::Forbidden,
            AuthError::PasswordMismatch | AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError.
    ///
    /// Refresh and provider failures collapse into generic client-facing
    /// messages; the specific cause is only logged.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::RefreshTokenNotFound
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired => {
                AppError::new(self.kind(), "Refresh token is invalid")
            }
            AuthError::Provider(_) => {
                AppError::new(self.kind(), "Identity provider authentication failed")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Provider(msg) => {
                tracing::error!(message = %msg, "Identity provider error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountDisabled => {
                tracing::warn!("Request on disabled account");
            }
            AuthError::RefreshTokenRevoked => {
                tracing::warn!("Reuse of a rotated refresh token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
