//! Context management commands.

use std::path::Path;

use anyhow::Result;

use crate::config::{ClientConfig, Context};

/// Register a context. The first one becomes current.
pub fn create(
    name: &str,
    server: &str,
    settle_delay_ms: Option<u64>,
    client_config_path: &Path,
) -> Result<()> {
    if !(server.starts_with("http://") || server.starts_with("https://")) {
        anyhow::bail!("Server URL must start with http:// or https://, got \"{}\".", server);
    }

    let mut config = ClientConfig::load(client_config_path)?;
    let mut ctx = Context::new(name, server.trim_end_matches('/'));
    ctx.settle_delay_ms = settle_delay_ms;
    config.upsert_context(ctx);
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }
    config.save(client_config_path)?;

    println!("Context \"{}\" created.", name);
    println!("  Server: {}", server);
    Ok(())
}

pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: closet context create <name> --server <url>");
        return Ok(());
    }

    println!("{:2} {:20} {:40} {:10}", "", "NAME", "SERVER", "SESSION");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        let server = if ctx.server.is_empty() { "-" } else { &ctx.server };
        let session = if ctx.tokens.is_some() { "signed-in" } else { "-" };
        println!("{:2} {:20} {:40} {:10}", marker, ctx.name, server, session);
    }
    Ok(())
}

pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!(
            "Context \"{}\" not found. Run `closet context list` to see available contexts.",
            name
        );
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

pub fn set(
    name: &str,
    server: Option<&str>,
    settle_delay_ms: Option<u64>,
    client_config_path: &Path,
) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let ctx = config
        .get_mut(name)
        .ok_or_else(|| anyhow::anyhow!("Context \"{}\" not found.", name))?;

    if let Some(s) = server {
        ctx.server = s.trim_end_matches('/').to_string();
        // Tokens belong to the old server.
        ctx.tokens = None;
    }
    if settle_delay_ms.is_some() {
        ctx.settle_delay_ms = settle_delay_ms;
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" updated.", name);
    Ok(())
}

pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}
