//! Route guard middleware
//!
//! Runs before every request: classifies the path, resolves the session,
//! consults the allow-list, and emits exactly one of three decisions.
//! Every code path terminates in a decision; resolver failures read the
//! same as "no session".

use std::sync::OnceLock;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use regex::Regex;

use crate::api::server::AppState;
use crate::auth::admin::AdminAllowList;
use crate::auth::models::Session;
use crate::auth::provider::IdentityProvider;

/// Login form path
pub const LOGIN_PATH: &str = "/admin/login";
/// Authenticated landing page
pub const DASHBOARD_PATH: &str = "/admin";
/// Marker header stamped on allowed requests to the login page; downstream
/// layout selection only, never a security signal
pub const LOGIN_PAGE_HEADER: &str = "x-porchlight-login-page";

/// Request extension carrying the resolved session past the guard.
///
/// Usable as an extractor in handlers behind the guard; a handler reached
/// without the guard having attached a session rejects with 403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = crate::error::Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(crate::error::Error::Unauthorized)
    }
}

/// What kind of path a request is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Not intercepted: marketing pages, blog, assets, auth callbacks
    Public,
    /// The login form itself
    Login,
    /// Everything under the admin namespace
    AdminProtected,
}

/// Why a request is being bounced to the login page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// No session on an admin-protected path
    LoginRequired,
    /// Valid session, email not on the allow-list, admin path
    AdminRequired,
    /// Valid non-admin session visiting the login page
    NotAdmin,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::LoginRequired => "login_required",
            RedirectReason::AdminRequired => "admin_required",
            RedirectReason::NotAdmin => "not_admin",
        }
    }
}

/// Per-request outcome. Computed fresh every time, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow { login_page: bool },
    RedirectToLogin { reason: RedirectReason },
    RedirectToDashboard,
}

fn asset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\.(css|js|map|png|jpe?g|gif|svg|ico|webp|avif|woff2?|txt|xml)$")
            .expect("Invalid regex pattern - this is a bug in the codebase")
    })
}

/// Classify a request path.
///
/// Static assets and the auth callback namespace are excluded from
/// interception so a redirect to login can never loop through them.
pub fn classify(path: &str) -> PathClass {
    if path.starts_with("/auth/") || path.starts_with("/static/") || path.starts_with("/assets/") {
        return PathClass::Public;
    }
    if asset_pattern().is_match(path) {
        return PathClass::Public;
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed == LOGIN_PATH || path.starts_with("/admin/login/") {
        return PathClass::Login;
    }
    if trimmed == DASHBOARD_PATH || path.starts_with("/admin/") {
        return PathClass::AdminProtected;
    }

    PathClass::Public
}

/// The decision table. Pure so the whole matrix is testable without an
/// HTTP stack.
pub fn decide(
    class: PathClass,
    session: Option<&Session>,
    admins: &AdminAllowList,
) -> RouteDecision {
    match class {
        PathClass::Public => RouteDecision::Allow { login_page: false },
        PathClass::Login => match session {
            None => RouteDecision::Allow { login_page: true },
            Some(session) => {
                if admins.is_admin(&session.user.email) {
                    RouteDecision::RedirectToDashboard
                } else {
                    RouteDecision::RedirectToLogin {
                        reason: RedirectReason::NotAdmin,
                    }
                }
            }
        },
        PathClass::AdminProtected => match session {
            None => RouteDecision::RedirectToLogin {
                reason: RedirectReason::LoginRequired,
            },
            Some(session) => {
                if admins.is_admin(&session.user.email) {
                    RouteDecision::Allow { login_page: false }
                } else {
                    RouteDecision::RedirectToLogin {
                        reason: RedirectReason::AdminRequired,
                    }
                }
            }
        },
    }
}

/// Build the login redirect target, carrying the reason and, for protected
/// paths, the page the visitor was trying to reach.
fn login_redirect(reason: RedirectReason, original_path: Option<&str>) -> String {
    match original_path {
        Some(path) => format!(
            "{}?error={}&redirect={}",
            LOGIN_PATH,
            reason.as_str(),
            urlencoding::encode(path)
        ),
        None => format!("{}?error={}", LOGIN_PATH, reason.as_str()),
    }
}

/// Middleware entry point. A true gate: the decision completes before any
/// downstream handler runs.
pub async fn route_guard<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let class = classify(&path);

    // Public paths skip session resolution entirely
    if class == PathClass::Public {
        return next.run(req).await;
    }

    let (jar, session) = state.sessions.resolve(jar).await;
    let decision = decide(class, session.as_ref(), &state.admins);

    match decision {
        RouteDecision::Allow { login_page } => {
            if login_page {
                req.headers_mut()
                    .insert(LOGIN_PAGE_HEADER, HeaderValue::from_static("1"));
            }
            if let Some(session) = session {
                req.extensions_mut().insert(CurrentUser(session));
            }
            // Refreshed cookies ride along on the response
            (jar, next.run(req).await).into_response()
        }
        RouteDecision::RedirectToLogin { reason } => {
            let original = match reason {
                RedirectReason::LoginRequired | RedirectReason::AdminRequired => {
                    Some(path.as_str())
                }
                RedirectReason::NotAdmin => None,
            };
            tracing::debug!(path = %path, reason = reason.as_str(), "Redirecting to login");
            (jar, Redirect::to(&login_redirect(reason, original))).into_response()
        }
        RouteDecision::RedirectToDashboard => {
            (jar, Redirect::to(DASHBOARD_PATH)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::User;
    use chrono::{Duration, Utc};

    fn session(email: &str) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            user: User {
                id: "u-1".to_string(),
                email: email.to_string(),
                display_name: None,
            },
        }
    }

    fn admins() -> AdminAllowList {
        AdminAllowList::new(["me@example.com"])
    }

    #[test]
    fn test_classify_public_paths() {
        assert_eq!(classify("/"), PathClass::Public);
        assert_eq!(classify("/blog"), PathClass::Public);
        assert_eq!(classify("/blog/first-post"), PathClass::Public);
        assert_eq!(classify("/contact"), PathClass::Public);
    }

    #[test]
    fn test_classify_admin_paths() {
        assert_eq!(classify("/admin"), PathClass::AdminProtected);
        assert_eq!(classify("/admin/"), PathClass::AdminProtected);
        assert_eq!(classify("/admin/posts"), PathClass::AdminProtected);
        assert_eq!(classify("/admin/messages"), PathClass::AdminProtected);
    }

    #[test]
    fn test_classify_login_path() {
        assert_eq!(classify("/admin/login"), PathClass::Login);
        assert_eq!(classify("/admin/login/"), PathClass::Login);
        assert_eq!(classify("/admin/login/magic"), PathClass::Login);
    }

    #[test]
    fn test_classify_excludes_callback_namespace() {
        // Intercepting the callback would loop a fresh login forever
        assert_eq!(classify("/auth/callback"), PathClass::Public);
    }

    #[test]
    fn test_classify_excludes_assets() {
        assert_eq!(classify("/static/site.css"), PathClass::Public);
        assert_eq!(classify("/admin/logo.png"), PathClass::Public);
        assert_eq!(classify("/favicon.ico"), PathClass::Public);
    }

    #[test]
    fn test_public_allows_any_session_state() {
        let admins = admins();
        assert_eq!(
            decide(PathClass::Public, None, &admins),
            RouteDecision::Allow { login_page: false }
        );
        assert_eq!(
            decide(PathClass::Public, Some(&session("other@example.com")), &admins),
            RouteDecision::Allow { login_page: false }
        );
    }

    #[test]
    fn test_login_without_session_shows_form() {
        assert_eq!(
            decide(PathClass::Login, None, &admins()),
            RouteDecision::Allow { login_page: true }
        );
    }

    #[test]
    fn test_login_as_admin_goes_to_dashboard() {
        assert_eq!(
            decide(PathClass::Login, Some(&session("ME@example.com")), &admins()),
            RouteDecision::RedirectToDashboard
        );
    }

    #[test]
    fn test_login_as_non_admin_bounces_with_reason() {
        assert_eq!(
            decide(PathClass::Login, Some(&session("other@example.com")), &admins()),
            RouteDecision::RedirectToLogin {
                reason: RedirectReason::NotAdmin
            }
        );
    }

    #[test]
    fn test_protected_without_session_requires_login() {
        assert_eq!(
            decide(PathClass::AdminProtected, None, &admins()),
            RouteDecision::RedirectToLogin {
                reason: RedirectReason::LoginRequired
            }
        );
    }

    #[test]
    fn test_protected_as_non_admin_requires_admin() {
        assert_eq!(
            decide(
                PathClass::AdminProtected,
                Some(&session("other@example.com")),
                &admins()
            ),
            RouteDecision::RedirectToLogin {
                reason: RedirectReason::AdminRequired
            }
        );
    }

    #[test]
    fn test_protected_as_admin_is_allowed() {
        assert_eq!(
            decide(PathClass::AdminProtected, Some(&session("me@example.com")), &admins()),
            RouteDecision::Allow { login_page: false }
        );
    }

    #[test]
    fn test_login_redirect_carries_reason_and_path() {
        let target = login_redirect(RedirectReason::LoginRequired, Some("/admin/posts"));
        assert_eq!(target, "/admin/login?error=login_required&redirect=%2Fadmin%2Fposts");

        let target = login_redirect(RedirectReason::NotAdmin, None);
        assert_eq!(target, "/admin/login?error=not_admin");
    }
}
