//! Authentication and session management

pub mod admin;
pub mod controller;
pub mod cookies;
pub mod gateway;
pub mod guard;
pub mod models;
pub mod provider;
pub mod session;

pub use admin::AdminAllowList;
pub use controller::{AuthController, AuthSnapshot};
pub use gateway::CredentialGateway;
pub use guard::{classify, decide, PathClass, RedirectReason, RouteDecision};
pub use models::{AuthEvent, Session, SessionInfo, User};
pub use provider::{HttpIdentityProvider, IdentityProvider, TokenGrant};
pub use session::SessionStore;
