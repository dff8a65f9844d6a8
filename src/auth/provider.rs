//! Identity provider client
//!
//! Credential verification, token issuance, and user records all live in
//! the hosted identity service. This module is the only place that talks
//! to it; everything above works in terms of [`IdentityProvider`] so tests
//! can substitute an in-memory double.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::auth::models::User;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};

/// A freshly issued token pair
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Operations delegated to the external identity service.
///
/// Implementations translate provider responses into this crate's error
/// vocabulary; no cryptographic verification happens on our side.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Verify an email/password pair and mint a token pair
    fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<TokenGrant>> + Send;

    /// Ask the provider to email a one-time login link
    fn send_magic_link(&self, email: &str) -> impl Future<Output = Result<()>> + Send;

    /// Exchange a callback code for a token pair
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<TokenGrant>> + Send;

    /// Trade a refresh token for a new token pair
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = Result<TokenGrant>> + Send;

    /// Validate an access token and return the user it belongs to
    fn fetch_user(&self, access_token: &str) -> impl Future<Output = Result<User>> + Send;

    /// Revoke the session behind an access token, across all devices
    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Deserialize, Default)]
struct UserMetadata {
    #[serde(default)]
    name: Option<String>,
}

impl From<UserResponse> for User {
    fn from(payload: UserResponse) -> Self {
        Self {
            id: payload.id,
            email: payload.email.unwrap_or_default(),
            display_name: payload.user_metadata.and_then(|m| m.name),
        }
    }
}

/// HTTP client for the hosted identity service
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("provider.url: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::Config(format!("provider endpoint {}: {}", path, e)))
    }

    /// POST a token request and map the response into a grant.
    ///
    /// `rejected` is the error for a 4xx verdict, which differs by flow
    /// (bad password vs expired code).
    async fn token_request(
        &self,
        grant_type: &str,
        body: serde_json::Value,
        rejected: fn() -> Error,
    ) -> Result<TokenGrant> {
        let url = self.endpoint("/auth/v1/token")?;
        let response = self
            .http
            .post(url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let payload: TokenResponse = response.json().await?;
            return Ok(TokenGrant {
                access_token: payload.access_token,
                refresh_token: payload.refresh_token,
                expires_at: Utc::now() + Duration::seconds(payload.expires_in),
            });
        }

        if status.is_client_error() {
            tracing::debug!(%status, grant_type, "Provider rejected credential grant");
            return Err(rejected());
        }

        Err(Error::ProviderUnavailable(format!(
            "token endpoint returned {}",
            status
        )))
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn password_grant(&self, email: &str, password: &str) -> Result<TokenGrant> {
        self.token_request(
            "password",
            json!({ "email": email, "password": password }),
            || Error::InvalidCredentials,
        )
        .await
    }

    async fn send_magic_link(&self, email: &str) -> Result<()> {
        let url = self.endpoint("/auth/v1/otp")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "create_user": false }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_client_error() {
            // Do not reveal whether the address exists; the caller shows
            // the same "check your email" message either way.
            tracing::debug!(%status, "Provider declined magic link request");
            Ok(())
        } else {
            Err(Error::ProviderUnavailable(format!(
                "otp endpoint returned {}",
                status
            )))
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.token_request(
            "authorization_code",
            json!({ "auth_code": code }),
            || Error::ExpiredOrInvalidCode,
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.token_request(
            "refresh_token",
            json!({ "refresh_token": refresh_token }),
            || Error::Unauthenticated,
        )
        .await
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User> {
        let url = self.endpoint("/auth/v1/user")?;
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let payload: UserResponse = response.json().await?;
            return Ok(payload.into());
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthenticated);
        }

        Err(Error::ProviderUnavailable(format!(
            "user endpoint returned {}",
            status
        )))
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = self.endpoint("/auth/v1/logout")?;
        let response = self
            .http
            .post(url)
            .query(&[("scope", "global")])
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        // An already-revoked token is a successful logout
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(Error::ProviderUnavailable(format!(
                "logout endpoint returned {}",
                status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_payload_without_email() {
        let payload = UserResponse {
            id: "u-1".to_string(),
            email: None,
            user_metadata: None,
        };
        let user: User = payload.into();
        assert_eq!(user.email, "");
        assert!(user.display_name.is_none());
    }

    #[test]
    fn test_user_from_payload_with_metadata() {
        let payload: UserResponse = serde_json::from_value(json!({
            "id": "u-2",
            "email": "me@example.com",
            "user_metadata": { "name": "Me", "avatar": "x.png" }
        }))
        .unwrap();
        let user: User = payload.into();
        assert_eq!(user.email, "me@example.com");
        assert_eq!(user.display_name.as_deref(), Some("Me"));
    }

    #[test]
    fn test_endpoint_join_ignores_base_path() {
        let provider = HttpIdentityProvider::new(&ProviderConfig {
            url: "https://id.example.com/".to_string(),
            api_key: "key".to_string(),
        })
        .unwrap();
        let url = provider.endpoint("/auth/v1/token").unwrap();
        assert_eq!(url.as_str(), "https://id.example.com/auth/v1/token");
    }
}
