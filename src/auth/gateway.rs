//! Credential gateway
//!
//! Translates provider outcomes into sessions and typed failures, and
//! writes the resulting cookies through the session store. Verification
//! itself always happens on the provider's side.

use std::sync::Arc;

use axum_extra::extract::CookieJar;

use crate::auth::models::{AuthEvent, Session};
use crate::auth::provider::{IdentityProvider, TokenGrant};
use crate::auth::session::SessionStore;
use crate::error::Result;

pub struct CredentialGateway<P> {
    provider: Arc<P>,
    sessions: SessionStore<P>,
}

impl<P> Clone for CredentialGateway<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            sessions: self.sessions.clone(),
        }
    }
}

impl<P: IdentityProvider> CredentialGateway<P> {
    pub fn new(provider: Arc<P>, sessions: SessionStore<P>) -> Self {
        Self { provider, sessions }
    }

    /// Verify an email/password pair. On success the session cookies are
    /// written into the returned jar; on failure no cookie is touched.
    pub async fn login_with_password(
        &self,
        jar: CookieJar,
        email: &str,
        password: &str,
    ) -> Result<(CookieJar, Session)> {
        let grant = self.provider.password_grant(email, password).await?;
        let session = self.session_from_grant(grant).await?;
        let jar = self.sessions.write_session(jar, &session);
        self.sessions.emit(AuthEvent::SignedIn(session.clone()));
        tracing::info!(user_id = %session.user.id, "Password login succeeded");
        Ok((jar, session))
    }

    /// Ask the provider to send a one-time login link
    pub async fn request_magic_link(&self, email: &str) -> Result<()> {
        self.provider.send_magic_link(email).await?;
        tracing::info!("Magic link requested");
        Ok(())
    }

    /// Exchange a callback code for a session, writing its cookies
    pub async fn exchange_code(&self, jar: CookieJar, code: &str) -> Result<(CookieJar, Session)> {
        let grant = self.provider.exchange_code(code).await?;
        let session = self.session_from_grant(grant).await?;
        let jar = self.sessions.write_session(jar, &session);
        self.sessions.emit(AuthEvent::SignedIn(session.clone()));
        tracing::info!(user_id = %session.user.id, "Code exchange succeeded");
        Ok((jar, session))
    }

    async fn session_from_grant(&self, grant: TokenGrant) -> Result<Session> {
        let user = self.provider.fetch_user(&grant.access_token).await?;
        Ok(Session {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            user,
        })
    }
}
