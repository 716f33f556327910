pub mod context;
pub mod feed;
pub mod login;
pub mod react;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use closet_client::{ApiClient, Session, SocialClient};
use closet_flux::Flux;
use closet_social::{register_handlers, SocialContext};

use crate::config::{ClientConfig, Context};

/// A Flux instance wired to the current context's server.
pub struct Connection {
    pub flux: Flux,
    pub client: Arc<SocialClient>,
    session: Arc<Session>,
    context: Context,
}

impl Connection {
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let context = config.require_current()?.clone();
        let session = Arc::new(match context.tokens.clone() {
            Some(tokens) => Session::with_tokens(&context.server, tokens),
            None => Session::new(&context.server),
        });
        let client = SocialClient::new(ApiClient::new(&context.server, session.clone())).shared();

        let flux = Flux::new();
        let social = SocialContext::new(
            client.clone(),
            client.clone(),
            flux.store().clone(),
            context.reconciler_config(),
        );
        register_handlers(&flux, Arc::new(social));

        Ok(Self {
            flux,
            client,
            session,
            context,
        })
    }

    /// Write back tokens the session refreshed or dropped.
    pub async fn persist_session(&self, client_config_path: &Path) -> Result<()> {
        let tokens = self.session.tokens().await;
        if tokens == self.context.tokens {
            return Ok(());
        }
        tracing::debug!(context = %self.context.name, "session changed, saving");
        let mut config = ClientConfig::load(client_config_path)?;
        config.set_tokens(&self.context.name, tokens)?;
        config.save(client_config_path)
    }
}
