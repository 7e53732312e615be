//! Access Token Codec
//!
//! Issues and verifies HS256-signed access tokens (JWT). The subject is
//! the user's email; roles ride along as a claim so the access filter can
//! authorize without a second lookup. Verification allows zero clock leeway.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::config::AuthConfig;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Token verification failures. All map to 401 at the boundary; the
/// distinction exists for logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature mismatch")]
    SignatureMismatch,
    #[error("Token expired")]
    Expired,
}

/// Signed claim set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user email
    pub sub: String,
    /// Role codes granted at issue time
    pub roles: Vec<String>,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Verified token contents
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject: String,
    pub roles: Vec<UserRole>,
    pub expires_at: DateTime<Utc>,
}

/// HS256 access token codec
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: chrono::Duration,
}

impl AccessTokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No grace period: an expired token is expired
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(&config.token_secret),
            decoding_key: DecodingKey::from_secret(&config.token_secret),
            validation,
            access_token_ttl: chrono::Duration::seconds(config.access_token_ttl.as_secs() as i64),
        }
    }

    /// Issue a signed token for a subject with its current roles
    pub fn issue(&self, subject: &str, roles: &[UserRole]) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.iter().map(|r| r.code().to_string()).collect(),
            iat: now.timestamp(),
            exp: (now + self.access_token_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                    _ => TokenError::Malformed,
                }
            })?;

        let claims = data.claims;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;

        Ok(VerifiedToken {
            subject: claims.sub,
            roles: UserRole::from_codes(claims.roles.iter().map(String::as_str)),
            expires_at,
        })
    }

    /// Extract the subject from a token whose signature is valid but which
    /// may be expired. Used only for logging on rejected requests.
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}
