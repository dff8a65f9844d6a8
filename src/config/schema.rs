//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub site: SiteConfig,
}

/// Server configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Identity provider configuration
///
/// The provider owns credential verification and token issuance; this
/// server only calls its REST endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub url: String,

    /// Publishable API key sent with every provider request
    #[serde(default)]
    pub api_key: String,
}

fn default_provider_url() -> String {
    "http://127.0.0.1:9999".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: default_provider_url(),
            api_key: String::new(),
        }
    }
}

/// Authentication and authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Emails allowed into the admin dashboard. Compared case-insensitively.
    #[serde(default)]
    pub admin_emails: Vec<String>,

    /// Mark session cookies Secure (enable in production)
    #[serde(default)]
    pub secure_cookies: bool,

    /// Cookie domain; unset in development, root domain in production
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Session cookie lifetime in days
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
}

fn default_session_ttl_days() -> i64 {
    7
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_emails: Vec::new(),
            secure_cookies: false,
            cookie_domain: None,
            session_ttl_days: default_session_ttl_days(),
        }
    }
}

/// Site presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_site_title() -> String {
    "Porchlight".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            base_url: default_base_url(),
        }
    }
}
