//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;

// ============================================================================
// Register
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub retype_password: String,
    /// Role codes; omitted means `ROLE_USER`
    #[serde(default)]
    pub roles: Vec<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// ============================================================================
// Login / Tokens
// ============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed access token
    pub token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    pub token_type: String,
    pub username: String,
    pub roles: Vec<String>,
    pub id: String,
}

/// Refresh request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Refresh response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
}

// ============================================================================
// Account Lifecycle
// ============================================================================

/// Activation query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveAccountParams {
    pub email: String,
    #[serde(rename = "active-code")]
    pub active_code: String,
}

/// Activation response: 0 = mismatch, 1 = already active, 2 = activated
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAccountResponse {
    pub status: u8,
}

/// Email uniqueness query
#[derive(Debug, Clone, Deserialize)]
pub struct EmailUniqueParams {
    pub email: String,
}

/// Email uniqueness response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailUniqueResponse {
    pub unique: bool,
}

/// Reset password response; the generated password appears here once
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    pub password: String,
}

// ============================================================================
// Users
// ============================================================================

/// User profile response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub active: bool,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            roles: user.roles.iter().map(|r| r.code().to_string()).collect(),
            active: user.active,
        }
    }
}

/// Admin listing query parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    pub keyword: Option<String>,
    #[serde(default)]
    pub page: u64,
    pub limit: Option<u64>,
}

/// Admin listing response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub total_pages: u64,
    pub total: u64,
    pub users: Vec<UserResponse>,
}

/// Profile update request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// ============================================================================
// Federated Login
// ============================================================================

/// Consent URL for a provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAuthUrlResponse {
    pub url: String,
}

/// Callback query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SocialCallbackParams {
    pub code: String,
}
