//! `closet react <post-id>`: toggle the like on one post.

use std::path::Path;

use anyhow::Result;
use closet_client::PostsApi;
use closet_social::{Notice, ReactionState, ShowPostReq, ToggleReactionReq};

use super::Connection;
use crate::config::ClientConfig;

const SLOT: &str = "cli";

pub async fn react(post_id: &str, client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let conn = Connection::open(&config)?;

    let post = conn
        .client
        .get_post(post_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load post {}: {}", post_id, e))?;

    conn.flux
        .emit(ShowPostReq::PATH, ShowPostReq { slot: SLOT.into(), post: post.clone() })
        .await;
    conn.flux
        .emit(
            ToggleReactionReq::PATH,
            ToggleReactionReq { slot: SLOT.into(), current_liked: post.is_liked },
        )
        .await;
    conn.persist_session(client_config_path).await?;

    if let Some(notice) = conn.flux.get_as::<Notice>(Notice::PATH) {
        anyhow::bail!("{}", notice.message);
    }
    let state = conn
        .flux
        .get_as::<ReactionState>(&ReactionState::path(SLOT))
        .ok_or_else(|| anyhow::anyhow!("no reaction state for post {}", post_id))?;

    let verb = if state.liked { "Liked" } else { "Unliked" };
    println!("{} {} ({} likes).", verb, state.post_id, state.like_count);
    Ok(())
}
