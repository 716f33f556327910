//! Login / logout commands.

use std::path::Path;

use anyhow::Result;
use closet_client::PasswordLogin;

use crate::config::ClientConfig;

/// Log in to the current context's server and store the session.
pub async fn login(username: &str, password: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    let ctx = config.require_current()?.clone();

    let tokens = PasswordLogin::new(&ctx.server, username, password)
        .login()
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    config.set_tokens(&ctx.name, Some(tokens))?;
    config.save(client_config_path)?;

    println!("Logged in as {}.", username);
    println!("Session saved to context \"{}\".", ctx.name);
    Ok(())
}

/// Clear the session of the current context.
pub fn logout(client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let current_name = config.current_context.clone();
    if current_name.is_empty() {
        anyhow::bail!("No current context.");
    }

    config
        .set_tokens(&current_name, None)
        .map_err(|_| anyhow::anyhow!("Current context not found."))?;
    config.save(client_config_path)?;
    println!("Logged out from context \"{}\".", current_name);
    Ok(())
}
