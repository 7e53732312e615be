//! User Query and Profile Use Cases
//!
//! Administrative listing plus profile reads and updates.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::{UserPage, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Default page size for the admin listing
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// User queries
pub struct UserQueries<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UserQueries<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Paged listing, optionally filtered by an email keyword
    pub async fn list(
        &self,
        keyword: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AuthResult<UserPage> {
        let per_page = if per_page == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            per_page
        };
        self.user_repo.list(keyword, page, per_page).await
    }

    pub async fn by_id(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn by_email(&self, email: &Email) -> AuthResult<User> {
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Registration-time check: is this email still free?
    pub async fn email_unique(&self, email: &str) -> AuthResult<bool> {
        let email = Email::new(email).map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(!self.user_repo.exists_by_email(&email).await?)
    }

    /// Update profile names
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> AuthResult<User> {
        let mut user = self.by_id(user_id).await?;
        user.set_names(first_name, last_name);
        self.user_repo.update(&user).await?;
        Ok(user)
    }
}
