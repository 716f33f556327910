//! Reaction reconciler for one feed slot.
//!
//! The slot shows one post at a time. A toggle applies the flipped value
//! at once, sends the add/remove request, and settles:
//!
//! - success: the optimistic value stands and keeps overriding snapshots
//!   until the slot shows another post;
//! - 409 conflict: the server was already in the requested state, so the
//!   opposite request is sent and its result is taken as the truth;
//! - any other failure: the previous value comes back and a notice is
//!   raised.
//!
//! Slot state sits behind a `std::sync::Mutex` that is never held across
//! an `.await`. Store subscribers run while it is held and must not call
//! back into the reconciler.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use closet_client::{ApiError, PostSnapshot, ReactionApi};
use closet_flux::{Optimistic, StateStore, Ticket};

use crate::config::ReconcilerConfig;
use crate::state::{FeedInvalidated, Notice, Reaction, ReactionSettled, ReactionState};

/// How a call to [`ReactionReconciler::toggle`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Another toggle was still pending; nothing was sent.
    Ignored,
    /// The server accepted the change. `corrected` is set when a conflict
    /// made the opposite action the authoritative one.
    Settled { reaction: Reaction, corrected: bool },
    /// The request failed and the previous value was restored.
    RolledBack { error: String },
    /// The slot moved to another post before the request finished.
    Superseded,
}

struct Slot {
    post_id: String,
    cell: Optimistic<Reaction>,
}

impl Slot {
    fn view(&self) -> ReactionState {
        let r = self.cell.value();
        ReactionState {
            post_id: self.post_id.clone(),
            liked: r.liked,
            like_count: r.like_count,
            has_local_override: self.cell.has_override(),
            pending: self.cell.is_pending(),
        }
    }
}

pub struct ReactionReconciler {
    slot: String,
    api: Arc<dyn ReactionApi>,
    store: Arc<StateStore>,
    config: ReconcilerConfig,
    inner: Mutex<Slot>,
}

impl ReactionReconciler {
    /// Create the reconciler for `slot`, showing `post`, and publish its
    /// initial state.
    pub fn new(
        slot: impl Into<String>,
        post: &PostSnapshot,
        api: Arc<dyn ReactionApi>,
        store: Arc<StateStore>,
        config: ReconcilerConfig,
    ) -> Self {
        let this = Self {
            slot: slot.into(),
            api,
            store,
            config,
            inner: Mutex::new(Slot {
                post_id: post.id.clone(),
                cell: Optimistic::new(Reaction::from(post)),
            }),
        };
        this.publish(&this.lock());
        this
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn state(&self) -> ReactionState {
        self.lock().view()
    }

    pub fn post_id(&self) -> String {
        self.lock().post_id.clone()
    }

    /// Flip the reaction from `current_liked` and settle it with the
    /// server. Resolves once the mutation has settled.
    pub async fn toggle(&self, current_liked: bool) -> ToggleOutcome {
        let intended = !current_liked;
        let (post_id, ticket) = {
            let mut slot = self.lock();
            let next = slot.cell.value().toggled(intended);
            let Some(ticket) = slot.cell.begin(next) else {
                tracing::debug!(slot = %self.slot, "toggle ignored, mutation pending");
                return ToggleOutcome::Ignored;
            };
            self.publish(&slot);
            (slot.post_id.clone(), ticket)
        };
        tracing::debug!(slot = %self.slot, post_id = %post_id, intended, "reaction toggled");

        let (result, corrected) = match self.send(&post_id, intended).await {
            Err(ApiError::Conflict(msg)) => {
                tracing::info!(post_id = %post_id, intended, "reaction conflict ({}), sending opposite", msg);
                (self.send(&post_id, !intended).await, true)
            }
            other => (other, false),
        };

        match result {
            Ok(()) => {
                let actual = if corrected { !intended } else { intended };
                self.settle_success(&post_id, ticket, actual, corrected)
            }
            Err(e) => self.settle_failure(&post_id, ticket, e),
        }
    }

    /// Passive update from fresh server data. Returns whether the slot
    /// took it: snapshots of other posts, and any snapshot while a local
    /// change is pending or overriding, are dropped.
    pub fn apply_snapshot(&self, post: &PostSnapshot) -> bool {
        let mut slot = self.lock();
        if slot.post_id != post.id {
            return false;
        }
        if !slot.cell.sync(Reaction::from(post)) {
            tracing::debug!(slot = %self.slot, post_id = %post.id, "snapshot ignored, local override");
            return false;
        }
        self.publish(&slot);
        true
    }

    /// Show `post` in this slot. A different post starts over from its
    /// snapshot; an outstanding toggle for the old post settles without
    /// touching the slot. The same post is a passive update.
    pub fn show_post(&self, post: &PostSnapshot) -> bool {
        let mut slot = self.lock();
        if slot.post_id == post.id {
            drop(slot);
            return self.apply_snapshot(post);
        }
        tracing::debug!(slot = %self.slot, from = %slot.post_id, to = %post.id, "slot reset");
        slot.post_id = post.id.clone();
        slot.cell.reset(Reaction::from(post));
        self.publish(&slot);
        true
    }

    async fn send(&self, post_id: &str, like: bool) -> Result<(), ApiError> {
        if like {
            self.api.add_reaction(post_id).await
        } else {
            self.api.remove_reaction(post_id).await
        }
    }

    fn settle_success(
        &self,
        post_id: &str,
        ticket: Ticket<Reaction>,
        actual: bool,
        corrected: bool,
    ) -> ToggleOutcome {
        let outcome = {
            let mut slot = self.lock();
            let settled = if corrected {
                corrected_reaction(*ticket.previous(), actual)
            } else {
                *slot.cell.value()
            };
            if slot.cell.confirm(&ticket, settled) {
                self.publish(&slot);
                ToggleOutcome::Settled {
                    reaction: settled,
                    corrected,
                }
            } else {
                ToggleOutcome::Superseded
            }
        };

        let settled = match &outcome {
            ToggleOutcome::Settled { reaction, .. } => *reaction,
            _ => corrected_reaction(*ticket.previous(), actual),
        };
        tracing::info!(
            post_id,
            liked = settled.liked,
            like_count = settled.like_count,
            corrected,
            "reaction settled"
        );
        self.store.set(
            &ReactionSettled::path(post_id),
            ReactionSettled {
                post_id: post_id.to_string(),
                liked: settled.liked,
                like_count: settled.like_count,
            },
        );
        self.schedule_invalidation(post_id);
        outcome
    }

    fn settle_failure(&self, post_id: &str, ticket: Ticket<Reaction>, error: ApiError) -> ToggleOutcome {
        tracing::warn!(post_id, "reaction failed, rolling back: {}", error);
        let restored = {
            let mut slot = self.lock();
            let restored = slot.cell.rollback(&ticket);
            if restored {
                self.publish(&slot);
            }
            restored
        };
        self.store.set(Notice::PATH, Notice::reaction_failed(post_id));
        if restored {
            ToggleOutcome::RolledBack {
                error: error.to_string(),
            }
        } else {
            ToggleOutcome::Superseded
        }
    }

    fn schedule_invalidation(&self, post_id: &str) {
        let store = Arc::clone(&self.store);
        let delay = self.config.settle_delay();
        let post_id = post_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(post_id = %post_id, "feed invalidated");
            store.set(FeedInvalidated::PATH, FeedInvalidated { post_id });
        });
    }

    fn publish(&self, slot: &Slot) {
        self.store.set(&ReactionState::path(&self.slot), slot.view());
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The reaction after a conflict made `actual` authoritative: the count
/// moves only by the net change from the value shown before the toggle.
fn corrected_reaction(previous: Reaction, actual: bool) -> Reaction {
    if previous.liked == actual {
        Reaction::new(actual, previous.like_count)
    } else {
        previous.toggled(actual)
    }
}
