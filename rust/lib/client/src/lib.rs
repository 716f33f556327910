//! Closet HTTP client.
//!
//! Typed access to the social endpoints the reaction engine depends on.
//! Authentication goes through a pluggable [`TokenSource`]; [`Session`] is
//! the signed-in user's token owner with refresh-on-expiry.
//!
//! ```ignore
//! use closet_client::{ApiClient, ReactionApi, Session, SocialClient};
//!
//! let session = Arc::new(Session::with_tokens(base, tokens));
//! let client = SocialClient::new(ApiClient::new(base, session));
//! client.add_reaction("post-1").await?;
//! ```

pub mod error;
pub mod http;
pub mod model;
pub mod reaction;
pub mod token;

pub use error::ApiError;
pub use http::ApiClient;
pub use model::{PostPayload, PostSnapshot, PostsPayload};
pub use reaction::{PostsApi, ReactionApi, SocialClient};
pub use token::{LoginResponse, NoAuth, PasswordLogin, Session, StaticToken, TokenSource, Tokens};
