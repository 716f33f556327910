//! Post payloads and their normalization.
//!
//! The feed endpoints are not consistent about response shape. Each
//! endpoint gets one wire enum that accepts every shape it is known to
//! return and converts into [`PostSnapshot`] as soon as it is decoded, so
//! nothing past this module branches on shape.

use serde::{Deserialize, Serialize};

/// Authoritative reaction data for one post, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSnapshot {
    pub id: String,
    pub is_liked: bool,
    pub likes: u32,
}

impl PostSnapshot {
    pub fn new(id: impl Into<String>, is_liked: bool, likes: u32) -> Self {
        Self {
            id: id.into(),
            is_liked,
            likes,
        }
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

/// `likes` is either a count or the list of users who liked the post.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireLikes {
    Count(u64),
    Users(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
pub struct WirePost {
    #[serde(alias = "_id")]
    id: WireId,
    #[serde(default, rename = "isLiked", alias = "is_liked", alias = "liked")]
    is_liked: bool,
    #[serde(default, alias = "likeCount", alias = "like_count")]
    likes: Option<WireLikes>,
}

impl From<WirePost> for PostSnapshot {
    fn from(w: WirePost) -> Self {
        let id = match w.id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        };
        let likes = match w.likes {
            None => 0,
            Some(WireLikes::Count(n)) => u32::try_from(n).unwrap_or(u32::MAX),
            Some(WireLikes::Users(users)) => u32::try_from(users.len()).unwrap_or(u32::MAX),
        };
        PostSnapshot {
            id,
            is_liked: w.is_liked,
            likes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WirePostList {
    Bare(Vec<WirePost>),
    Posts { posts: Vec<WirePost> },
}

impl WirePostList {
    fn into_posts(self) -> Vec<WirePost> {
        match self {
            WirePostList::Bare(posts) | WirePostList::Posts { posts } => posts,
        }
    }
}

/// Response of `GET /posts`: `[..]`, `{posts: [..]}`, `{data: [..]}` or
/// `{data: {posts: [..]}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PostsPayload {
    Data { data: WirePostList },
    List(WirePostList),
}

impl From<PostsPayload> for Vec<PostSnapshot> {
    fn from(payload: PostsPayload) -> Self {
        let list = match payload {
            PostsPayload::Data { data } => data,
            PostsPayload::List(list) => list,
        };
        list.into_posts().into_iter().map(PostSnapshot::from).collect()
    }
}

/// Response of `GET /posts/{id}`: the post itself, `{data: post}` or
/// `{post: post}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PostPayload {
    Data { data: WirePost },
    Post { post: WirePost },
    Bare(WirePost),
}

impl From<PostPayload> for PostSnapshot {
    fn from(payload: PostPayload) -> Self {
        match payload {
            PostPayload::Data { data: p } | PostPayload::Post { post: p } | PostPayload::Bare(p) => {
                p.into()
            }
        }
    }
}
