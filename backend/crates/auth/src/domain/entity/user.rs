//! User Entity
//!
//! Account aggregate: credentials, profile basics, activation state and
//! linked federated identities.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{
    activation_code::ActivationCode, email::Email, user_password::UserPassword,
    user_role::UserRole,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Email (unique, lowercased, doubles as the login name)
    pub email: Email,
    /// Argon2id password hash
    pub password: UserPassword,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Granted roles
    pub roles: Vec<UserRole>,
    /// Whether the account may authenticate
    pub active: bool,
    /// Pending activation code, cleared on activation
    pub activation_code: Option<ActivationCode>,
    /// Linked Google account id
    pub google_account_id: Option<String>,
    /// Linked Facebook account id
    pub facebook_account_id: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new inactive user pending email activation
    pub fn new(email: Email, password: UserPassword, roles: Vec<UserRole>) -> Self {
        let now = Utc::now();
        let roles = if roles.is_empty() {
            vec![UserRole::default()]
        } else {
            roles
        };

        Self {
            user_id: UserId::new(),
            email,
            password,
            first_name: None,
            last_name: None,
            roles,
            active: false,
            activation_code: Some(ActivationCode::generate()),
            google_account_id: None,
            facebook_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an already-active user from a federated identity.
    ///
    /// Provider accounts skip email activation; the provider has already
    /// verified the address.
    pub fn new_federated(email: Email, password: UserPassword) -> Self {
        let mut user = Self::new(email, password, vec![UserRole::User]);
        user.active = true;
        user.activation_code = None;
        user
    }

    /// The login name shown to clients
    pub fn username(&self) -> &str {
        self.email.as_str()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(UserRole::is_admin)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    /// Mark the account active and clear the activation code
    pub fn activate(&mut self) {
        self.active = true;
        self.activation_code = None;
        self.updated_at = Utc::now();
    }

    /// Replace the password hash
    pub fn set_password(&mut self, password: UserPassword) {
        self.password = password;
        self.updated_at = Utc::now();
    }

    /// Block or re-enable the account
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.updated_at = Utc::now();
    }

    /// Update the profile names
    pub fn set_names(&mut self, first_name: Option<String>, last_name: Option<String>) {
        self.first_name = first_name;
        self.last_name = last_name;
        self.updated_at = Utc::now();
    }

    /// Attach a Google account id
    pub fn link_google(&mut self, account_id: String) {
        self.google_account_id = Some(account_id);
        self.updated_at = Utc::now();
    }

    /// Attach a Facebook account id
    pub fn link_facebook(&mut self, account_id: String) {
        self.facebook_account_id = Some(account_id);
        self.updated_at = Utc::now();
    }
}
