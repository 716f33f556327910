//! Requests handled by the social module.

use closet_client::PostSnapshot;

/// Show `post` in feed slot `slot`, replacing whatever it showed.
#[derive(Debug, Clone)]
pub struct ShowPostReq {
    pub slot: String,
    pub post: PostSnapshot,
}

impl ShowPostReq {
    pub const PATH: &'static str = "post/show";
}

/// The user pressed the like button in `slot`. `current_liked` is the
/// state the button displayed.
#[derive(Debug, Clone)]
pub struct ToggleReactionReq {
    pub slot: String,
    pub current_liked: bool,
}

impl ToggleReactionReq {
    pub const PATH: &'static str = "post/toggle-reaction";
}

/// Fresh server data for one post.
#[derive(Debug, Clone)]
pub struct SnapshotReq {
    pub post: PostSnapshot,
}

impl SnapshotReq {
    pub const PATH: &'static str = "feed/snapshot";
}

/// Refetch a page of the feed.
#[derive(Debug, Clone)]
pub struct RefreshFeedReq {
    pub page: u32,
    pub limit: u32,
}

impl RefreshFeedReq {
    pub const PATH: &'static str = "feed/refresh";
}

impl Default for RefreshFeedReq {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}
