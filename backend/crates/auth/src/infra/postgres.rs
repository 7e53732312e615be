//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{RefreshTokenId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{Provider, RefreshTokenRepository, UserPage, UserRepository};
use crate::domain::value_object::{
    activation_code::ActivationCode, email::Email, user_password::UserPassword,
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    password_hash,
    first_name,
    last_name,
    roles,
    active,
    activation_code,
    google_account_id,
    facebook_account_id,
    created_at,
    updated_at
"#;

const TOKEN_COLUMNS: &str = r#"
    token_id,
    token,
    user_id,
    mobile,
    revoked,
    expired,
    expires_at,
    created_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                password_hash,
                first_name,
                last_name,
                roles,
                active,
                activation_code,
                google_account_id,
                facebook_account_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(role_codes(&user.roles))
        .bind(user.active)
        .bind(user.activation_code.as_ref().map(|c| c.as_str()))
        .bind(&user.google_account_id)
        .bind(&user.facebook_account_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_by_provider(
        &self,
        provider: Provider,
        account_id: &str,
    ) -> AuthResult<Option<User>> {
        let column = match provider {
            Provider::Google => "google_account_id",
            Provider::Facebook => "facebook_account_id",
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                first_name = $4,
                last_name = $5,
                roles = $6,
                active = $7,
                activation_code = $8,
                google_account_id = $9,
                facebook_account_id = $10,
                updated_at = $11
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(role_codes(&user.roles))
        .bind(user.active)
        .bind(user.activation_code.as_ref().map(|c| c.as_str()))
        .bind(&user.google_account_id)
        .bind(&user.facebook_account_id)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, keyword: Option<&str>, page: u64, per_page: u64) -> AuthResult<UserPage> {
        let pattern = keyword.map(|k| format!("%{}%", k));
        let offset = page.saturating_mul(per_page);

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::text IS NULL OR email ILIKE $1)
            ORDER BY email
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR email ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(|r| r.into_user())
            .collect::<AuthResult<Vec<_>>>()?;

        Ok(UserPage {
            users,
            total: total as u64,
        })
    }
}

// ============================================================================
// Refresh Token Ledger Implementation
// ============================================================================

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                token_id,
                token,
                user_id,
                mobile,
                revoked,
                expired,
                expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(token.token_id.as_uuid())
        .bind(&token.token)
        .bind(token.user_id.as_uuid())
        .bind(token.mobile)
        .bind(token.revoked)
        .bind(token.expired)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_token()))
    }

    async fn rotate(&self, presented: &str, replacement: &RefreshToken) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent redemptions of the same token;
        // the loser sees revoked = true and fails.
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1 FOR UPDATE"
        ))
        .bind(presented)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::RefreshTokenNotFound);
        };
        let current = row.into_token();

        if current.revoked {
            return Err(AuthError::RefreshTokenRevoked);
        }

        if current.is_expired() {
            sqlx::query("UPDATE refresh_tokens SET expired = TRUE WHERE token_id = $1")
                .bind(current.token_id.as_uuid())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Err(AuthError::RefreshTokenExpired);
        }

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE token_id = $1")
            .bind(current.token_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                token_id,
                token,
                user_id,
                mobile,
                revoked,
                expired,
                expires_at,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(replacement.token_id.as_uuid())
        .bind(&replacement.token)
        .bind(replacement.user_id.as_uuid())
        .bind(replacement.mobile)
        .bind(replacement.revoked)
        .bind(replacement.expired)
        .bind(replacement.expires_at)
        .bind(replacement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");

        Ok(deleted)
    }
}

fn role_codes(roles: &[UserRole]) -> Vec<String> {
    roles.iter().map(|r| r.code().to_string()).collect()
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    roles: Vec<String>,
    active: bool,
    activation_code: Option<String>,
    google_account_id: Option<String>,
    facebook_account_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid stored hash: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            password,
            first_name: self.first_name,
            last_name: self.last_name,
            roles: UserRole::from_codes(self.roles.iter().map(String::as_str)),
            active: self.active,
            activation_code: self.activation_code.map(ActivationCode::from_db),
            google_account_id: self.google_account_id,
            facebook_account_id: self.facebook_account_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token_id: Uuid,
    token: String,
    user_id: Uuid,
    mobile: bool,
    revoked: bool,
    expired: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            token_id: RefreshTokenId::from_uuid(self.token_id),
            token: self.token,
            user_id: UserId::from_uuid(self.user_id),
            mobile: self.mobile,
            revoked: self.revoked,
            expired: self.expired,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}
