//! Session cookie construction
//!
//! Every cookie this crate writes goes through the builders here so the
//! attribute set stays identical across login, refresh, and logout paths.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::AuthConfig;

/// Access token cookie
pub const ACCESS_COOKIE: &str = "pl_access_token";
/// Refresh token cookie
pub const REFRESH_COOKIE: &str = "pl_refresh_token";
/// Access token expiry (unix seconds), used to refresh before a dead round-trip
pub const EXPIRY_COOKIE: &str = "pl_token_expiry";

/// Cookie names written by older deployments. Cleared on logout so a stale
/// secondary cookie can never resurrect a session.
pub const LEGACY_COOKIE_NAMES: &[&str] = &["pl_session", "sb-access-token", "sb-refresh-token"];

/// Centralized cookie attribute set
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub domain: Option<String>,
    pub ttl_days: i64,
}

impl CookieSettings {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            secure: config.secure_cookies,
            domain: config.cookie_domain.clone(),
            ttl_days: config.session_ttl_days,
        }
    }
}

/// Create a session cookie carrying the shared attribute set
pub fn session_cookie(name: &str, value: &str, settings: &CookieSettings) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(settings.ttl_days));

    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// Create a removal cookie for a session cookie name.
///
/// Carries the same path/domain so the browser matches the original write.
pub fn clear_cookie(name: &str, settings: &CookieSettings) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), ""))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO);

    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}
