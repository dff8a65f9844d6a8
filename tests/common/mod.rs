//! Shared test fixtures: an in-memory identity provider double
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};

use porchlight::auth::cookies::{CookieSettings, ACCESS_COOKIE, EXPIRY_COOKIE, REFRESH_COOKIE};
use porchlight::auth::gateway::CredentialGateway;
use porchlight::auth::provider::{IdentityProvider, TokenGrant};
use porchlight::auth::session::SessionStore;
use porchlight::auth::User;
use porchlight::error::{Error, Result};

pub const PASSWORD: &str = "correct-horse";

/// In-memory stand-in for the hosted identity service.
///
/// Tokens are minted sequentially; `fail_network` makes every call return
/// `ProviderUnavailable` to simulate an unreachable provider.
pub struct MockProvider {
    user: User,
    counter: AtomicUsize,
    pub fail_network: AtomicBool,
    valid_access: Mutex<HashSet<String>>,
    valid_refresh: Mutex<HashSet<String>>,
    valid_codes: Mutex<HashSet<String>>,
    pub sign_out_calls: AtomicUsize,
    pub magic_links: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(email: &str) -> Self {
        Self {
            user: User {
                id: "user-1".to_string(),
                email: email.to_string(),
                display_name: Some("Test User".to_string()),
            },
            counter: AtomicUsize::new(0),
            fail_network: AtomicBool::new(false),
            valid_access: Mutex::new(HashSet::new()),
            valid_refresh: Mutex::new(HashSet::new()),
            valid_codes: Mutex::new(HashSet::new()),
            sign_out_calls: AtomicUsize::new(0),
            magic_links: Mutex::new(Vec::new()),
        }
    }

    fn check_network(&self) -> Result<()> {
        if self.fail_network.load(Ordering::SeqCst) {
            return Err(Error::ProviderUnavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn mint(&self) -> TokenGrant {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let grant = TokenGrant {
            access_token: format!("access-{}", n),
            refresh_token: format!("refresh-{}", n),
            expires_at: Utc::now() + Duration::hours(1),
        };
        self.valid_access
            .lock()
            .unwrap()
            .insert(grant.access_token.clone());
        self.valid_refresh
            .lock()
            .unwrap()
            .insert(grant.refresh_token.clone());
        grant
    }

    /// Pre-mint a session as if a login happened elsewhere
    pub fn issue_grant(&self) -> TokenGrant {
        self.mint()
    }

    /// Register a one-time code the provider will accept
    pub fn issue_code(&self, code: &str) {
        self.valid_codes.lock().unwrap().insert(code.to_string());
    }

    /// Revoke a single access token (simulates early expiry)
    pub fn revoke_access(&self, token: &str) {
        self.valid_access.lock().unwrap().remove(token);
    }

    /// Revoke a refresh token
    pub fn revoke_refresh(&self, token: &str) {
        self.valid_refresh.lock().unwrap().remove(token);
    }
}

impl IdentityProvider for MockProvider {
    async fn password_grant(&self, email: &str, password: &str) -> Result<TokenGrant> {
        self.check_network()?;
        if email.eq_ignore_ascii_case(&self.user.email) && password == PASSWORD {
            Ok(self.mint())
        } else {
            Err(Error::InvalidCredentials)
        }
    }

    async fn send_magic_link(&self, email: &str) -> Result<()> {
        self.check_network()?;
        self.magic_links.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.check_network()?;
        if self.valid_codes.lock().unwrap().remove(code) {
            Ok(self.mint())
        } else {
            Err(Error::ExpiredOrInvalidCode)
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.check_network()?;
        if self.valid_refresh.lock().unwrap().remove(refresh_token) {
            Ok(self.mint())
        } else {
            Err(Error::Unauthenticated)
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User> {
        self.check_network()?;
        if self.valid_access.lock().unwrap().contains(access_token) {
            Ok(self.user.clone())
        } else {
            Err(Error::Unauthenticated)
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<()> {
        self.check_network()?;
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        // Global scope: every device's tokens die
        self.valid_access.lock().unwrap().clear();
        self.valid_refresh.lock().unwrap().clear();
        Ok(())
    }
}

pub fn cookie_settings() -> CookieSettings {
    CookieSettings {
        secure: false,
        domain: None,
        ttl_days: 7,
    }
}

pub fn store(provider: &Arc<MockProvider>) -> SessionStore<MockProvider> {
    SessionStore::new(Arc::clone(provider), cookie_settings())
}

pub fn gateway(provider: &Arc<MockProvider>) -> CredentialGateway<MockProvider> {
    CredentialGateway::new(Arc::clone(provider), store(provider))
}

/// Build a jar holding the cookies a browser would carry for a grant
pub fn jar_for_grant(grant: &TokenGrant) -> CookieJar {
    CookieJar::new()
        .add(Cookie::new(ACCESS_COOKIE, grant.access_token.clone()))
        .add(Cookie::new(REFRESH_COOKIE, grant.refresh_token.clone()))
        .add(Cookie::new(
            EXPIRY_COOKIE,
            grant.expires_at.timestamp().to_string(),
        ))
}
