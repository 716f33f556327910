//! Flux wiring for the social requests.

use std::sync::Arc;

use closet_flux::{Flux, StateStore, StateValue};

use crate::feed::SocialContext;
use crate::request::*;
use crate::state::*;

/// Register the social handlers and the subscription that keeps
/// `feed/page` in step with settled reactions.
pub fn register_handlers(flux: &Flux, ctx: Arc<SocialContext>) {
    // post/show
    {
        let ctx = ctx.clone();
        flux.on(ShowPostReq::PATH, move |_, payload, _| {
            let ctx = ctx.clone();
            async move {
                let Some(req) = payload.downcast_ref::<ShowPostReq>() else {
                    return;
                };
                ctx.slots.show(&req.slot, &req.post);
            }
        });
    }

    // post/toggle-reaction
    {
        let ctx = ctx.clone();
        flux.on(ToggleReactionReq::PATH, move |_, payload, _| {
            let ctx = ctx.clone();
            async move {
                let Some(req) = payload.downcast_ref::<ToggleReactionReq>() else {
                    return;
                };
                let Some(reconciler) = ctx.slots.get(&req.slot) else {
                    tracing::warn!(slot = %req.slot, "toggle for unknown slot");
                    return;
                };
                let outcome = reconciler.toggle(req.current_liked).await;
                tracing::debug!(slot = %req.slot, ?outcome, "toggle finished");
            }
        });
    }

    // feed/snapshot
    {
        let ctx = ctx.clone();
        flux.on(SnapshotReq::PATH, move |_, payload, _| {
            let ctx = ctx.clone();
            async move {
                if let Some(req) = payload.downcast_ref::<SnapshotReq>() {
                    ctx.slots.sync_post(&req.post);
                }
            }
        });
    }

    // feed/refresh
    flux.on(RefreshFeedReq::PATH, move |_, payload, store: Arc<StateStore>| {
        let ctx = ctx.clone();
        async move {
            let Some(req) = payload.downcast_ref::<RefreshFeedReq>() else {
                return;
            };
            handle_refresh(req, &store, &ctx).await;
        }
    });

    let weak = Arc::downgrade(flux.store());
    flux.subscribe(ReactionSettled::PATTERN, move |_, value: &StateValue| {
        let (Some(settled), Some(store)) = (value.downcast_ref::<ReactionSettled>(), weak.upgrade())
        else {
            return;
        };
        store.update::<FeedPage, _>(FeedPage::PATH, |page| {
            let mut page = page?.clone();
            let mut hit = false;
            for post in page.posts.iter_mut().filter(|p| p.id == settled.post_id) {
                post.is_liked = settled.liked;
                post.likes = settled.like_count;
                hit = true;
            }
            hit.then_some(page)
        });
    });
}

/// Handle `feed/refresh`.
async fn handle_refresh(req: &RefreshFeedReq, store: &StateStore, ctx: &SocialContext) {
    let previous = store.get_as::<FeedPage>(FeedPage::PATH).unwrap_or_default();
    store.set(
        FeedPage::PATH,
        FeedPage {
            loading: true,
            error: None,
            ..previous.clone()
        },
    );

    match ctx.posts.list_posts(req.page, req.limit).await {
        Ok(posts) => {
            let posts: Vec<_> = posts.iter().map(|p| ctx.slots.sync_post(p)).collect();
            tracing::debug!(page = req.page, count = posts.len(), "feed refreshed");
            store.set(
                FeedPage::PATH,
                FeedPage {
                    posts,
                    page: req.page,
                    loading: false,
                    error: None,
                },
            );
        }
        Err(e) => {
            tracing::warn!(page = req.page, "feed refresh failed: {}", e);
            store.set(
                FeedPage::PATH,
                FeedPage {
                    loading: false,
                    error: Some(e.to_string()),
                    ..previous
                },
            );
        }
    }
}
