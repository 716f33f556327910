//! Client-side context management.
//!
//! Reads/writes `~/.closet/config.toml`.

use std::path::{Path, PathBuf};

use closet_client::Tokens;
use closet_social::ReconcilerConfig;
use serde::{Deserialize, Serialize};

/// A single context: one closet API server and the session for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,

    /// API base URL (e.g. "https://api.closet.example/v1").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Session tokens (set by `closet login`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Tokens>,

    /// Overrides the reconciler's settling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_delay_ms: Option<u64>,
}

impl Context {
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            tokens: None,
            settle_delay_ms: None,
        }
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        let cfg = ReconcilerConfig::default();
        match self.settle_delay_ms {
            Some(ms) => cfg.with_settle_delay_ms(ms),
            None => cfg,
        }
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.closet/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    /// The active context, or an error telling the user how to pick one.
    pub fn require_current(&self) -> anyhow::Result<&Context> {
        let ctx = self
            .current()
            .ok_or_else(|| anyhow::anyhow!("No current context. Run `closet use context <name>`."))?;
        if ctx.server.is_empty() {
            anyhow::bail!(
                "No server URL set for context \"{}\". Run `closet context set {} --server <url>`.",
                ctx.name,
                ctx.name
            );
        }
        Ok(ctx)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Remove a context by name. Returns true if it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }

    /// Replace the stored tokens of context `name`.
    pub fn set_tokens(&mut self, name: &str, tokens: Option<Tokens>) -> anyhow::Result<()> {
        let ctx = self
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("Context \"{}\" not found.", name))?;
        ctx.tokens = tokens;
        Ok(())
    }
}

/// Return the closet config directory (~/.closet).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".closet")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert!(config.current().is_none());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ClientConfig::default();
        config.current_context = "stage".into();
        let mut ctx = Context::new("stage", "http://localhost:8080");
        ctx.tokens = Some(Tokens {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            expires_at: 1_700_000_000,
        });
        ctx.settle_delay_ms = Some(250);
        config.upsert_context(ctx);
        config.save(&path).unwrap();

        let back = ClientConfig::load(&path).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.require_current().unwrap().reconciler_config().settle_delay_ms, 250);
    }

    #[test]
    fn require_current_needs_server() {
        let mut config = ClientConfig::default();
        config.upsert_context(Context::new("empty", ""));
        assert!(config.require_current().is_err());

        config.current_context = "empty".into();
        let err = config.require_current().unwrap_err().to_string();
        assert!(err.contains("--server"), "{}", err);
    }

    #[test]
    fn remove_current_context_clears_selection() {
        let mut config = ClientConfig::default();
        config.upsert_context(Context::new("a", "http://a"));
        config.current_context = "a".into();

        assert!(config.remove_context("a"));
        assert!(config.current_context.is_empty());
        assert!(!config.remove_context("a"));
    }

    #[test]
    fn default_settle_delay() {
        assert_eq!(Context::new("a", "http://a").reconciler_config(), ReconcilerConfig::default());
    }
}
