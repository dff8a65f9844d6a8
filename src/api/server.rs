//! HTTP server assembly

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::admin::AdminAllowList;
use crate::auth::cookies::CookieSettings;
use crate::auth::gateway::CredentialGateway;
use crate::auth::guard::route_guard;
use crate::auth::provider::{HttpIdentityProvider, IdentityProvider};
use crate::auth::session::SessionStore;
use crate::config::{Config, SiteConfig};
use crate::error::Result;

use super::routes;
use crate::ui;

/// Application state shared across handlers.
///
/// Nothing here is mutable after startup; every request re-validates
/// against the identity provider, so there is no cross-request cache to
/// keep coherent.
pub struct AppState<P> {
    pub site: SiteConfig,
    pub admins: Arc<AdminAllowList>,
    pub sessions: SessionStore<P>,
    pub gateway: CredentialGateway<P>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            site: self.site.clone(),
            admins: Arc::clone(&self.admins),
            sessions: self.sessions.clone(),
            gateway: self.gateway.clone(),
        }
    }
}

impl<P: IdentityProvider> AppState<P> {
    /// Wire up the auth stack from configuration
    pub fn new(config: &Config, provider: Arc<P>) -> Self {
        let settings = CookieSettings::from_config(&config.auth);
        let sessions = SessionStore::new(Arc::clone(&provider), settings);
        let gateway = CredentialGateway::new(provider, sessions.clone());
        let admins = Arc::new(AdminAllowList::new(&config.auth.admin_emails));

        Self {
            site: config.site.clone(),
            admins,
            sessions,
            gateway,
        }
    }
}

/// Run the HTTP server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let provider = Arc::new(HttpIdentityProvider::new(&config.provider)?);
    let state = AppState::new(&config, provider);

    if state.admins.is_empty() {
        tracing::warn!("No admin emails configured; the dashboard is unreachable");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes.
///
/// The route guard is layered over everything; its own classifier decides
/// which paths pass through untouched.
pub fn create_router<P: IdentityProvider>(state: AppState<P>) -> Router {
    Router::new()
        // Public pages
        .route("/", get(ui::home::<P>))
        .route("/blog", get(ui::blog_index::<P>))
        .route("/blog/{slug}", get(ui::blog_post::<P>))
        .route("/contact", get(ui::contact_page::<P>))
        // API routes
        .route("/api/health", get(routes::health))
        .route("/api/session", get(routes::session_info::<P>))
        .route("/api/contact", post(routes::submit_contact::<P>))
        // Auth flows
        .route("/admin/login", get(ui::login_page::<P>).post(routes::login::<P>))
        .route("/admin/login/magic", post(routes::login_magic::<P>))
        .route("/auth/callback", get(routes::auth_callback::<P>))
        // Outside the guarded namespace so a signed-out or non-admin
        // visitor can still terminate a session
        .route(
            "/auth/logout",
            get(routes::logout::<P>).post(routes::logout::<P>),
        )
        // Admin pages
        .route("/admin", get(ui::dashboard::<P>))
        .route("/admin/posts", get(ui::admin_posts::<P>))
        .route("/admin/messages", get(ui::admin_messages::<P>))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), route_guard::<P>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
