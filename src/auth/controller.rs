//! Client-side auth controller
//!
//! Mirrors session state reactively for interactive UI: a snapshot of
//! {user, session, loading, error} published through a watch channel, fed
//! by auth state change events. The controller signals success or failure
//! of login/magic-link/logout operations; where to navigate afterwards is
//! the calling UI's decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum_extra::extract::CookieJar;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::auth::gateway::CredentialGateway;
use crate::auth::models::{AuthEvent, Session, User};
use crate::auth::provider::IdentityProvider;
use crate::auth::session::SessionStore;
use crate::error::{Error, Result};

/// Reactive auth state for UI components
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
            error: None,
        }
    }
}

/// Detaches the event listener when dropped and releases the
/// single-subscription slot.
pub struct ListenerGuard {
    subscribed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.task.abort();
        self.subscribed.store(false, Ordering::SeqCst);
    }
}

pub struct AuthController<P> {
    gateway: CredentialGateway<P>,
    sessions: SessionStore<P>,
    /// The durable cookie copy, standing in for the browser's cookie store
    jar: Arc<RwLock<CookieJar>>,
    state: Arc<watch::Sender<AuthSnapshot>>,
    subscribed: Arc<AtomicBool>,
}

impl<P> Clone for AuthController<P> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            sessions: self.sessions.clone(),
            jar: Arc::clone(&self.jar),
            state: Arc::clone(&self.state),
            subscribed: Arc::clone(&self.subscribed),
        }
    }
}

impl<P: IdentityProvider> AuthController<P> {
    pub fn new(gateway: CredentialGateway<P>, sessions: SessionStore<P>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            gateway,
            sessions,
            jar: Arc::new(RwLock::new(CookieJar::new())),
            state: Arc::new(state),
            subscribed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current state, cloned out of the channel
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Fetch session state once, as on mount. Clears the loading flag
    /// whether or not a session was found.
    pub async fn init(&self) {
        let jar = self.jar.read().await.clone();
        let (jar, session) = self.sessions.resolve(jar).await;
        *self.jar.write().await = jar;

        self.state.send_modify(|s| {
            s.user = session.as_ref().map(|s| s.user.clone());
            s.session = session;
            s.loading = false;
            s.error = None;
        });
    }

    /// Attach the auth event listener.
    ///
    /// At most one listener per controller: a second attach while the
    /// first guard is alive returns `None` instead of stacking a
    /// duplicate, so re-renders cannot accumulate listeners. Drop the
    /// guard to detach.
    pub fn attach(&self) -> Option<ListenerGuard> {
        if self
            .subscribed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let mut events = self.sessions.subscribe();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedIn(session))
                    | Ok(AuthEvent::TokenRefreshed(session)) => {
                        state.send_modify(|s| {
                            s.user = Some(session.user.clone());
                            s.session = Some(session);
                            s.loading = false;
                            s.error = None;
                        });
                    }
                    Ok(AuthEvent::SignedOut) => {
                        state.send_modify(|s| {
                            s.user = None;
                            s.session = None;
                            s.loading = false;
                        });
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Some(ListenerGuard {
            subscribed: Arc::clone(&self.subscribed),
            task,
        })
    }

    /// Password login. Updates the snapshot and returns the session on
    /// success; the caller decides where to navigate.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let jar = self.jar.read().await.clone();
        match self.gateway.login_with_password(jar, email, password).await {
            Ok((jar, session)) => {
                *self.jar.write().await = jar;
                self.state.send_modify(|s| {
                    s.user = Some(session.user.clone());
                    s.session = Some(session.clone());
                    s.loading = false;
                    s.error = None;
                });
                Ok(session)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Request a one-time login link for the given email
    pub async fn send_magic_link(&self, email: &str) -> Result<()> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.gateway.request_magic_link(email).await {
            Ok(()) => {
                self.state.send_modify(|s| s.loading = false);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Sign out everywhere and clear local state.
    ///
    /// Always succeeds; the caller must follow up with a full page
    /// navigation so no in-memory state survives.
    pub async fn logout(&self) {
        let jar = self.jar.read().await.clone();
        let jar = self.sessions.logout(jar).await;
        *self.jar.write().await = jar;

        self.state.send_modify(|s| {
            s.user = None;
            s.session = None;
            s.loading = false;
            s.error = None;
        });
    }

    fn fail(&self, error: &Error) {
        // Error enum messages are already user-facing; provider internals
        // never pass through here
        let message = error.to_string();
        self.state.send_modify(|s| {
            s.loading = false;
            s.error = Some(message.clone());
        });
    }
}
