//! `closet feed`.

use std::path::Path;

use anyhow::Result;
use closet_social::{FeedPage, RefreshFeedReq};

use super::Connection;
use crate::config::ClientConfig;

pub async fn feed(page: u32, limit: u32, json_output: bool, client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;
    let conn = Connection::open(&config)?;

    conn.flux.emit(RefreshFeedReq::PATH, RefreshFeedReq { page, limit }).await;
    conn.persist_session(client_config_path).await?;

    let feed = conn
        .flux
        .get_as::<FeedPage>(FeedPage::PATH)
        .ok_or_else(|| anyhow::anyhow!("feed was not loaded"))?;
    if let Some(err) = feed.error {
        anyhow::bail!("Failed to load feed: {}", err);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&feed.posts)?);
        return Ok(());
    }
    if feed.posts.is_empty() {
        println!("No posts on page {}.", feed.page);
        return Ok(());
    }
    println!("{:30} {:6} {:>8}", "POST", "LIKED", "LIKES");
    for post in &feed.posts {
        let liked = if post.is_liked { "yes" } else { "-" };
        println!("{:30} {:6} {:>8}", post.id, liked, post.likes);
    }
    Ok(())
}
