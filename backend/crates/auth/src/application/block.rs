//! Block / Enable Account Use Case
//!
//! Administrative toggle of the `active` flag. Existing refresh tokens are
//! left in place; a blocked account is rejected at the refresh and access
//! filter checks instead, so re-enabling restores open sessions.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Block/enable use case
pub struct BlockUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> BlockUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, user_id: &UserId, active: bool) -> AuthResult<User> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.set_active(active);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, active, "Account active flag changed");

        Ok(user)
    }
}
