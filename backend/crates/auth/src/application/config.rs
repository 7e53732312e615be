//! Application Configuration
//!
//! Configuration for the Auth application layer. Explicit and owned by the
//! caller; nothing here reads the environment or global state.

use std::time::Duration;

use platform::password::PasswordSpec;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret for access tokens (32 bytes)
    pub token_secret: [u8; 32],
    /// Access token (JWT) lifetime (24 hours)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime for web clients (30 days)
    pub refresh_ttl_web: Duration,
    /// Refresh token lifetime for mobile clients (60 days)
    pub refresh_ttl_mobile: Duration,
    /// Composition of generated passwords (administrative resets)
    pub password_spec: PasswordSpec,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            access_token_ttl: Duration::from_secs(24 * 3600),
            refresh_ttl_web: Duration::from_secs(30 * 24 * 3600),
            refresh_ttl_mobile: Duration::from_secs(60 * 24 * 3600),
            password_spec: PasswordSpec::default(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development. Tokens do not survive restarts.
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Refresh token lifetime for a device class
    pub fn refresh_ttl(&self, mobile: bool) -> chrono::Duration {
        let ttl = if mobile {
            self.refresh_ttl_mobile
        } else {
            self.refresh_ttl_web
        };
        chrono::Duration::seconds(ttl.as_secs() as i64)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
