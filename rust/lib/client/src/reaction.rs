use std::sync::Arc;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::model::{PostPayload, PostSnapshot, PostsPayload};

/// Remote reaction operations for a post.
///
/// `ApiError::Conflict` from `add_reaction` means the post is already
/// liked; from `remove_reaction`, that it is not liked.
#[async_trait::async_trait]
pub trait ReactionApi: Send + Sync + 'static {
    async fn add_reaction(&self, post_id: &str) -> Result<(), ApiError>;
    async fn remove_reaction(&self, post_id: &str) -> Result<(), ApiError>;
}

/// Read access to the posts feed.
#[async_trait::async_trait]
pub trait PostsApi: Send + Sync + 'static {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<PostSnapshot>, ApiError>;
    async fn get_post(&self, post_id: &str) -> Result<PostSnapshot, ApiError>;
}

/// REST client for posts and reactions.
///
/// - `GET    {base}/posts?page=&limit=`
/// - `GET    {base}/posts/{id}`
/// - `POST   {base}/posts/{id}/reactions`
/// - `DELETE {base}/posts/{id}/reactions`
#[derive(Clone)]
pub struct SocialClient {
    api: ApiClient,
}

impl SocialClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn reactions_url(&self, post_id: &str) -> String {
        self.api.url(&format!("posts/{}/reactions", post_id))
    }
}

#[async_trait::async_trait]
impl ReactionApi for SocialClient {
    async fn add_reaction(&self, post_id: &str) -> Result<(), ApiError> {
        let url = self.reactions_url(post_id);
        self.api
            .send(|http| http.post(&url).json(&serde_json::json!({ "type": "like" })))
            .await?;
        Ok(())
    }

    async fn remove_reaction(&self, post_id: &str) -> Result<(), ApiError> {
        let url = self.reactions_url(post_id);
        self.api.send(|http| http.delete(&url)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PostsApi for SocialClient {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<PostSnapshot>, ApiError> {
        let url = self.api.url("posts");
        let payload: PostsPayload = self
            .api
            .send_json(|http| http.get(&url).query(&[("page", page), ("limit", limit)]))
            .await?;
        Ok(payload.into())
    }

    async fn get_post(&self, post_id: &str) -> Result<PostSnapshot, ApiError> {
        let url = self.api.url(&format!("posts/{}", post_id));
        let payload: PostPayload = self.api.send_json(|http| http.get(&url)).await?;
        Ok(payload.into())
    }
}
