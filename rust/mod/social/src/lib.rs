//! Social feed module: optimistic reactions on feed posts.
//!
//! Each visible post sits in a feed slot with its own
//! [`ReactionReconciler`]. Views talk to the module only through Flux:
//!
//! | Request                | Payload             |
//! |------------------------|---------------------|
//! | `post/show`            | [`ShowPostReq`]       |
//! | `post/toggle-reaction` | [`ToggleReactionReq`] |
//! | `feed/snapshot`        | [`SnapshotReq`]       |
//! | `feed/refresh`         | [`RefreshFeedReq`]    |
//!
//! and read `feed/slots/{slot}/reaction`, `feed/page`,
//! `feed/reactions/{post_id}`, `feed/invalidated` and `app/notice`.

pub mod config;
pub mod feed;
pub mod handlers;
pub mod reconciler;
pub mod request;
pub mod state;

pub use config::ReconcilerConfig;
pub use feed::{FeedSlots, SocialContext};
pub use handlers::register_handlers;
pub use reconciler::{ReactionReconciler, ToggleOutcome};
pub use request::*;
pub use state::*;
