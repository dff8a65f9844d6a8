//! API route handlers

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use super::server::AppState;
use crate::auth::guard::{DASHBOARD_PATH, LOGIN_PATH};
use crate::auth::models::{LoginRequest, MagicLinkRequest, SessionInfo};
use crate::auth::provider::IdentityProvider;
use crate::error::Error;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Only ever redirect within this site. Anything that is not a local
/// absolute path falls back to the dashboard.
fn safe_redirect(target: Option<&str>) -> String {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") => t.to_string(),
        _ => DASHBOARD_PATH.to_string(),
    }
}

fn login_error(reason: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", LOGIN_PATH, urlencoding::encode(reason)))
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

// Session state (initial fetch for the client controller)

pub async fn session_info<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar).await;

    let info = match &session {
        Some(session) => {
            SessionInfo::from_session(session, state.admins.is_admin(&session.user.email))
        }
        None => SessionInfo::anonymous(),
    };

    (jar, Json(ApiResponse::ok(info)))
}

// Contact form
//
// Persistence lives in the hosted backend; this endpoint validates and
// hands off. The session is consulted only to annotate the submission.

pub async fn submit_contact<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    Json(req): Json<ContactRequest>,
) -> impl IntoResponse {
    if req.email.trim().is_empty() || req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::err("email and message are required")),
        )
            .into_response();
    }

    let (jar, session) = state.sessions.resolve(jar).await;
    let reference = uuid::Uuid::new_v4();
    tracing::info!(
        %reference,
        from = %req.email,
        authenticated = session.is_some(),
        "Contact message received"
    );

    (jar, Json(ApiResponse::ok(reference.to_string()))).into_response()
}

// Login flows

pub async fn login<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    Form(req): Form<LoginRequest>,
) -> impl IntoResponse {
    let target = safe_redirect(req.redirect.as_deref());

    match state
        .gateway
        .login_with_password(jar, &req.email, &req.password)
        .await
    {
        Ok((jar, _session)) => (jar, Redirect::to(&target)).into_response(),
        Err(Error::InvalidCredentials) => login_error("invalid_credentials").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Password login failed");
            login_error("auth_failed").into_response()
        }
    }
}

pub async fn login_magic<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    Form(req): Form<MagicLinkRequest>,
) -> impl IntoResponse {
    match state.gateway.request_magic_link(&req.email).await {
        Ok(()) => Redirect::to(&format!("{}?sent=1", LOGIN_PATH)),
        Err(e) => {
            tracing::warn!(error = %e, "Magic link request failed");
            login_error("auth_failed")
        }
    }
}

/// Provider callback: exchange the one-time code for a session
pub async fn auth_callback<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return login_error("invalid_code").into_response();
    };

    match state.gateway.exchange_code(jar, &code).await {
        Ok((jar, _session)) => {
            let target = safe_redirect(params.redirect_to.as_deref());
            (jar, Redirect::to(&target)).into_response()
        }
        Err(Error::ExpiredOrInvalidCode) => login_error("invalid_code").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Code exchange failed");
            login_error("auth_failed").into_response()
        }
    }
}

/// Sign out everywhere and land back on the login form
pub async fn logout<P: IdentityProvider>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = state.sessions.logout(jar).await;
    (jar, Redirect::to(LOGIN_PATH))
}
