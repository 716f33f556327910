//! State published by the social module.
//!
//! Every type here is written into the Flux store; views read them by
//! path and never mutate them.

use closet_client::PostSnapshot;

/// The optimistic value of one post's reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reaction {
    pub liked: bool,
    pub like_count: u32,
}

impl Reaction {
    pub fn new(liked: bool, like_count: u32) -> Self {
        Self { liked, like_count }
    }

    /// The value after flipping to `liked`. The count never drops below 0.
    pub fn toggled(self, liked: bool) -> Self {
        let like_count = if liked {
            self.like_count.saturating_add(1)
        } else {
            self.like_count.saturating_sub(1)
        };
        Self { liked, like_count }
    }
}

impl From<&PostSnapshot> for Reaction {
    fn from(p: &PostSnapshot) -> Self {
        Self::new(p.is_liked, p.likes)
    }
}

/// What a feed slot displays. Stored at `feed/slots/{slot}/reaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionState {
    pub post_id: String,
    pub liked: bool,
    pub like_count: u32,
    pub has_local_override: bool,
    pub pending: bool,
}

impl ReactionState {
    pub fn path(slot: &str) -> String {
        format!("feed/slots/{}/reaction", slot)
    }

    pub fn reaction(&self) -> Reaction {
        Reaction::new(self.liked, self.like_count)
    }
}

/// A reaction mutation reached the server. Stored at
/// `feed/reactions/{post_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionSettled {
    pub post_id: String,
    pub liked: bool,
    pub like_count: u32,
}

impl ReactionSettled {
    pub const PATTERN: &'static str = "feed/reactions/+";

    pub fn path(post_id: &str) -> String {
        format!("feed/reactions/{}", post_id)
    }
}

/// Raised one settling delay after a reaction settles; the host should
/// refetch the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedInvalidated {
    pub post_id: String,
}

impl FeedInvalidated {
    pub const PATH: &'static str = "feed/invalidated";
}

/// The last fetched feed page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedPage {
    pub posts: Vec<PostSnapshot>,
    pub page: u32,
    pub loading: bool,
    pub error: Option<String>,
}

impl FeedPage {
    pub const PATH: &'static str = "feed/page";
}

/// User-facing message. Stored at `app/notice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: String,
    pub message: String,
    pub post_id: Option<String>,
}

impl Notice {
    pub const PATH: &'static str = "app/notice";

    pub const REACTION_FAILED: &'static str = "reaction_failed";

    pub fn reaction_failed(post_id: &str) -> Self {
        Self {
            code: Self::REACTION_FAILED.into(),
            message: "could not update like status".into(),
            post_id: Some(post_id.to_string()),
        }
    }
}
