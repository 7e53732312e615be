//! OAuth Provider Client
//!
//! Authorization-code exchange against Google and Facebook. Provider
//! failures surface as `AuthError::Provider` and reach clients as a
//! generic 401; the specifics land in the log.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::repository::{OAuthClient, Provider, ProviderProfile};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint and credential set for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub user_info_uri: String,
    /// Scopes requested at the consent screen
    pub scope: String,
}

impl ProviderConfig {
    /// Google endpoints with the given app credentials
    pub fn google(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            user_info_uri: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            scope: "openid email profile".to_string(),
        }
    }

    /// Facebook endpoints with the given app credentials
    pub fn facebook(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_uri: "https://www.facebook.com/v19.0/dialog/oauth".to_string(),
            token_uri: "https://graph.facebook.com/v19.0/oauth/access_token".to_string(),
            user_info_uri: "https://graph.facebook.com/me".to_string(),
            scope: "email public_profile".to_string(),
        }
    }
}

/// HTTP-backed OAuth client
pub struct HttpOAuthClient {
    http: reqwest::Client,
    google: Option<ProviderConfig>,
    facebook: Option<ProviderConfig>,
}

impl HttpOAuthClient {
    pub fn new(google: Option<ProviderConfig>, facebook: Option<ProviderConfig>) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            google,
            facebook,
        })
    }

    fn config(&self, provider: Provider) -> AuthResult<&ProviderConfig> {
        let config = match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Facebook => self.facebook.as_ref(),
        };
        config.ok_or_else(|| {
            AuthError::Provider(format!("Provider not configured: {}", provider.as_str()))
        })
    }

    async fn exchange_code(&self, config: &ProviderConfig, code: &str) -> AuthResult<String> {
        let response = self
            .http
            .post(&config.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("redirect_uri", config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "Token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Bad token response: {}", e)))?;

        Ok(token.access_token)
    }
}

impl OAuthClient for HttpOAuthClient {
    fn authorization_url(&self, provider: Provider) -> AuthResult<String> {
        let config = self.config(provider)?;
        let mut url = reqwest::Url::parse(&config.auth_uri)
            .map_err(|e| AuthError::Internal(format!("Bad provider auth URI: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("scope", &config.scope);
        Ok(url.to_string())
    }

    async fn fetch_profile(&self, provider: Provider, code: &str) -> AuthResult<ProviderProfile> {
        let config = self.config(provider)?;
        let access_token = self.exchange_code(config, code).await?;

        match provider {
            Provider::Google => {
                let profile: GoogleProfile = self
                    .http
                    .get(&config.user_info_uri)
                    .bearer_auth(&access_token)
                    .send()
                    .await
                    .map_err(|e| AuthError::Provider(format!("Profile fetch failed: {}", e)))?
                    .json()
                    .await
                    .map_err(|e| AuthError::Provider(format!("Bad profile response: {}", e)))?;

                let email = Email::new(&profile.email)
                    .map_err(|e| AuthError::Provider(format!("Provider email invalid: {}", e)))?;

                Ok(ProviderProfile {
                    provider,
                    account_id: profile.sub,
                    email,
                    given_name: profile.given_name,
                    family_name: profile.family_name,
                })
            }
            Provider::Facebook => {
                let profile: FacebookProfile = self
                    .http
                    .get(&config.user_info_uri)
                    .query(&[
                        ("fields", "id,email,first_name,last_name"),
                        ("access_token", access_token.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(|e| AuthError::Provider(format!("Profile fetch failed: {}", e)))?
                    .json()
                    .await
                    .map_err(|e| AuthError::Provider(format!("Bad profile response: {}", e)))?;

                let email = profile
                    .email
                    .ok_or_else(|| AuthError::Provider("Provider returned no email".to_string()))?;
                let email = Email::new(&email)
                    .map_err(|e| AuthError::Provider(format!("Provider email invalid: {}", e)))?;

                Ok(ProviderProfile {
                    provider,
                    account_id: profile.id,
                    email,
                    given_name: profile.first_name,
                    family_name: profile.last_name,
                })
            }
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleProfile {
    sub: String,
    email: String,
    given_name: Option<String>,
    family_name: Option<String>,
}

#[derive(Deserialize)]
struct FacebookProfile {
    id: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url() {
        let client = HttpOAuthClient::new(
            Some(ProviderConfig::google(
                "client-id".to_string(),
                "secret".to_string(),
                "https://app.example.com/callback".to_string(),
            )),
            None,
        )
        .unwrap();

        let url = client.authorization_url(Provider::Google).unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"));
        assert!(url.contains("scope=openid+email+profile"));
    }

    #[test]
    fn test_unconfigured_provider() {
        let client = HttpOAuthClient::new(None, None).unwrap();
        assert!(matches!(
            client.authorization_url(Provider::Facebook),
            Err(AuthError::Provider(_))
        ));
    }
}
