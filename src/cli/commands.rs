//! CLI command implementations

use anyhow::Result;
use std::fs;

use crate::api;
use crate::auth::AdminAllowList;
use crate::cli::{error, info, success, warn};
use crate::config;

/// Initialize a new porchlight.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new("porchlight.toml");

    if config_path.exists() {
        warn("porchlight.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created porchlight.toml");
    info("Set provider.url, provider.api_key, and auth.admin_emails, then run 'porchlight serve'");

    Ok(())
}

/// Start the website server
pub async fn serve(host: &str, port: u16) -> Result<()> {
    let config = config::load_config()?;

    if let Err(e) = api::run_server(config, host, port).await {
        error(&format!("Server failed: {}", e));
        return Err(e.into());
    }
    Ok(())
}

/// Print the configured admin allow-list
pub async fn admins() -> Result<()> {
    let config = config::load_config()?;
    let admins = AdminAllowList::new(&config.auth.admin_emails);

    if admins.is_empty() {
        warn("No admin emails configured; the dashboard is unreachable");
        return Ok(());
    }

    info(&format!("{} admin(s) configured:", admins.len()));
    let mut emails: Vec<&str> = admins.iter().collect();
    emails.sort_unstable();
    for email in emails {
        println!("  {}", email);
    }

    Ok(())
}
