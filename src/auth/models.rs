//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity fetched from the provider. Never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned identity id
    pub id: String,
    /// Email address used for admin authorization
    pub email: String,
    /// Display name, if the provider has one
    pub display_name: Option<String>,
}

/// A provider-issued token pair bound to a user and an expiry.
///
/// Created on login or code exchange, replaced on refresh, destroyed on
/// logout. The browser holds the durable copy; the server only sees it
/// for the span of one request.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque access token
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// When the access token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// User the tokens belong to
    pub user: User,
}

impl Session {
    /// Check whether the access token has passed its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Auth state change pushed to client-side subscribers
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

/// Password login form payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Path to land on after a successful login
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Magic-link request form payload
#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

/// JSON view of the current session for the client controller
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionInfo {
    /// View for an unauthenticated request
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            email: None,
            display_name: None,
            is_admin: false,
            expires_at: None,
        }
    }

    /// View for a validated session
    pub fn from_session(session: &Session, is_admin: bool) -> Self {
        Self {
            authenticated: true,
            email: Some(session.user.email.clone()),
            display_name: session.user.display_name.clone(),
            is_admin,
            expires_at: Some(session.expires_at),
        }
    }
}
