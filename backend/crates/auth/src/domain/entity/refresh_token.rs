//! Refresh Token Entity
//!
//! Ledger row for an opaque refresh token. A token is single-use: the
//! refresh flow marks the presented row revoked and inserts a replacement
//! in the same transaction.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{RefreshTokenId, UserId};
use platform::crypto::random_token;

/// Bytes of entropy in the opaque token string
const TOKEN_ENTROPY_BYTES: usize = 32;

/// Refresh token entity
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Internal UUID identifier
    pub token_id: RefreshTokenId,
    /// Opaque random token string (base64url, 32 bytes entropy)
    pub token: String,
    /// Owning user
    pub user_id: UserId,
    /// Issued to a mobile client (longer lifetime)
    pub mobile: bool,
    /// Rotated or administratively revoked
    pub revoked: bool,
    /// Marked expired by the ledger
    pub expired: bool,
    /// Hard expiry
    pub expires_at: DateTime<Utc>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Issue a fresh token for a user
    pub fn new(user_id: UserId, mobile: bool, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token_id: RefreshTokenId::new(),
            token: random_token(TOKEN_ENTROPY_BYTES),
            user_id,
            mobile,
            revoked: false,
            expired: false,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    /// Token type reported to clients
    pub const fn token_type() -> &'static str {
        "Bearer"
    }

    /// Whether the token is past its expiry or flagged expired
    pub fn is_expired(&self) -> bool {
        self.expired || self.expires_at <= Utc::now()
    }

    /// Whether the token may still be redeemed
    pub fn is_usable(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}
