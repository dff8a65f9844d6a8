//! Session resolution and cookie lifecycle
//!
//! The store is the only component that touches the transport-level session
//! representation. Handlers and the route guard hand it a request's cookie
//! jar and get back a validated session or nothing.

use std::sync::Arc;

use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::auth::cookies::{
    clear_cookie, session_cookie, CookieSettings, ACCESS_COOKIE, EXPIRY_COOKIE,
    LEGACY_COOKIE_NAMES, REFRESH_COOKIE,
};
use crate::auth::models::{AuthEvent, Session};
use crate::auth::provider::IdentityProvider;
use crate::error::{Error, Result};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Reads and writes the session cookies for one request/response cycle.
///
/// A session is only reported as valid after a successful provider
/// round-trip within the current request. Any provider failure reads as
/// "no session", never as authenticated.
pub struct SessionStore<P> {
    provider: Arc<P>,
    settings: CookieSettings,
    events: broadcast::Sender<AuthEvent>,
}

impl<P> Clone for SessionStore<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            settings: self.settings.clone(),
            events: self.events.clone(),
        }
    }
}

impl<P: IdentityProvider> SessionStore<P> {
    pub fn new(provider: Arc<P>, settings: CookieSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            settings,
            events,
        }
    }

    /// Subscribe to auth state change events (sign-in, sign-out, refresh)
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // No receivers is fine; events are advisory
        let _ = self.events.send(event);
    }

    /// Resolve the session carried by a request's cookies.
    ///
    /// Validates the access token against the provider; if it is stale and
    /// a refresh token is present, attempts one refresh and rewrites the
    /// cookies through the centralized attribute set. Returns the possibly
    /// updated jar alongside the outcome.
    pub async fn resolve(&self, jar: CookieJar) -> (CookieJar, Option<Session>) {
        let access = jar.get(ACCESS_COOKIE).map(|c| c.value().to_string());
        let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

        if access.is_none() && refresh.is_none() {
            return (jar, None);
        }

        // Expiry hint written at login/refresh time. An absent or garbled
        // hint reads as already-stale so resolution goes through refresh
        // and comes back with an authoritative expiry.
        let expires_at = jar
            .get(EXPIRY_COOKIE)
            .and_then(|c| c.value().parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        let stale = expires_at.map_or(true, |at| Utc::now() >= at);

        if let (Some(access_token), false) = (&access, stale) {
            match self.provider.fetch_user(access_token).await {
                Ok(user) => {
                    let session = Session {
                        access_token: access_token.clone(),
                        refresh_token: refresh.clone().unwrap_or_default(),
                        expires_at: expires_at.unwrap_or_else(Utc::now),
                        user,
                    };
                    return (jar, Some(session));
                }
                Err(Error::Unauthenticated) => {
                    // Token revoked or expired early; fall through to refresh
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session validation failed, treating as unauthenticated");
                    return (jar, None);
                }
            }
        }

        if let Some(refresh_token) = refresh {
            match self.refresh_session(&refresh_token).await {
                Ok(session) => {
                    let jar = self.write_session(jar, &session);
                    self.emit(AuthEvent::TokenRefreshed(session.clone()));
                    return (jar, Some(session));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Session refresh failed");
                    return (jar, None);
                }
            }
        }

        (jar, None)
    }

    /// One refresh attempt; a second rejection is a dead session
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let grant = self.provider.refresh(refresh_token).await?;
        let user = self.provider.fetch_user(&grant.access_token).await?;
        Ok(Session {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            user,
        })
    }

    /// Write a session's cookies, all through the shared attribute set
    pub fn write_session(&self, jar: CookieJar, session: &Session) -> CookieJar {
        jar.add(session_cookie(
            ACCESS_COOKIE,
            &session.access_token,
            &self.settings,
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            &session.refresh_token,
            &self.settings,
        ))
        .add(session_cookie(
            EXPIRY_COOKIE,
            &session.expires_at.timestamp().to_string(),
            &self.settings,
        ))
    }

    /// Sign out everywhere and clear every session cookie we have ever used.
    ///
    /// Idempotent: a jar with no session cookies still comes back cleared,
    /// and a provider that already revoked the token is not an error.
    pub async fn logout(&self, jar: CookieJar) -> CookieJar {
        // A previously cleared cookie reads as empty; nothing to revoke then
        if let Some(access) = jar.get(ACCESS_COOKIE).filter(|c| !c.value().is_empty()) {
            if let Err(e) = self.provider.sign_out(access.value()).await {
                tracing::warn!(error = %e, "Provider sign-out failed during logout");
            }
        }

        let mut jar = jar;
        for name in [ACCESS_COOKIE, REFRESH_COOKIE, EXPIRY_COOKIE]
            .iter()
            .chain(LEGACY_COOKIE_NAMES)
        {
            jar = jar.add(clear_cookie(name, &self.settings));
        }

        self.emit(AuthEvent::SignedOut);
        jar
    }
}
