//! Flux: client state engine for the closet apps.
//!
//! Rust owns the state and the logic; the platform layer only renders.
//!
//! - `get(path)` reads state (shared, no copy)
//! - `emit(path, payload)` sends a request to trie-routed handlers
//! - `subscribe(pattern)` observes writes through trie-matched patterns
//!
//! Paths are `/`-separated (`feed/slots/3/reaction`). Patterns accept
//! MQTT-style wildcards: `+` for one level, `#` for the rest.
//!
//! [`Optimistic`] is the shared building block for mutations that update
//! the displayed value before the server answers.

pub mod app;
pub mod optimistic;
pub mod router;
pub mod store;
pub mod trie;
pub mod value;

pub use app::Flux;
pub use optimistic::{Optimistic, Ticket};
pub use router::{BoxFuture, Payload, Router};
pub use store::{ChangeHandler, StateStore};
pub use value::{StateValue, SubscriptionId};
