use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use closet_client::{PostSnapshot, PostsApi, ReactionApi};
use closet_flux::StateStore;

use crate::config::ReconcilerConfig;
use crate::reconciler::ReactionReconciler;

/// The reconcilers of every visible feed slot, keyed by slot id.
///
/// Slots are independent: each has its own reconciler and lock, and a
/// post shown in two slots is reconciled twice.
pub struct FeedSlots {
    api: Arc<dyn ReactionApi>,
    store: Arc<StateStore>,
    config: ReconcilerConfig,
    slots: Mutex<BTreeMap<String, Arc<ReactionReconciler>>>,
}

impl FeedSlots {
    pub fn new(api: Arc<dyn ReactionApi>, store: Arc<StateStore>, config: ReconcilerConfig) -> Self {
        Self {
            api,
            store,
            config,
            slots: Mutex::new(BTreeMap::new()),
        }
    }

    /// Show `post` in `slot`, creating the slot on first use.
    pub fn show(&self, slot: &str, post: &PostSnapshot) -> Arc<ReactionReconciler> {
        let mut slots = self.lock();
        if let Some(existing) = slots.get(slot) {
            existing.show_post(post);
            return Arc::clone(existing);
        }
        let reconciler = Arc::new(ReactionReconciler::new(
            slot,
            post,
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            self.config.clone(),
        ));
        slots.insert(slot.to_string(), Arc::clone(&reconciler));
        reconciler
    }

    pub fn get(&self, slot: &str) -> Option<Arc<ReactionReconciler>> {
        self.lock().get(slot).cloned()
    }

    /// Stop tracking `slot`. Its reconciler lives on until outstanding
    /// toggles finish.
    pub fn remove(&self, slot: &str) -> bool {
        self.lock().remove(slot).is_some()
    }

    pub fn slot_ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Offer fresh server data to every slot showing `post`.
    ///
    /// Returns the values to display for it: the snapshot, unless a slot
    /// holds a local override, in which case that slot's value wins.
    pub fn sync_post(&self, post: &PostSnapshot) -> PostSnapshot {
        let reconcilers: Vec<_> = self.lock().values().cloned().collect();
        let mut shown = post.clone();
        for r in reconcilers {
            if r.apply_snapshot(post) {
                continue;
            }
            let state = r.state();
            if state.post_id == post.id {
                shown.is_liked = state.liked;
                shown.likes = state.like_count;
            }
        }
        shown
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<ReactionReconciler>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything the social handlers need.
pub struct SocialContext {
    pub slots: FeedSlots,
    pub posts: Arc<dyn PostsApi>,
}

impl SocialContext {
    pub fn new(
        reactions: Arc<dyn ReactionApi>,
        posts: Arc<dyn PostsApi>,
        store: Arc<StateStore>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            slots: FeedSlots::new(reactions, store, config),
            posts,
        }
    }
}
