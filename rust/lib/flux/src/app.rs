use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use crate::router::{Payload, Router};
use crate::store::StateStore;
use crate::value::{StateValue, SubscriptionId};

/// The client state engine: a state store plus a request router.
///
/// Views read state with `get`, send intents with `emit`, and observe
/// changes with `subscribe`. Handlers registered with `on` own all writes.
///
/// ```ignore
/// let flux = Flux::new();
/// flux.on("post/toggle-reaction", |_, payload, store| async move { /* ... */ });
/// flux.subscribe("feed/slots/+/reaction", |path, value| render(path, value));
/// flux.emit("post/toggle-reaction", req).await;
/// ```
pub struct Flux {
    store: Arc<StateStore>,
    router: Router,
}

impl Flux {
    pub fn new() -> Self {
        Self::with_store(Arc::new(StateStore::new()))
    }

    /// Build around an existing store, e.g. one shared with background tasks.
    pub fn with_store(store: Arc<StateStore>) -> Self {
        Self {
            store,
            router: Router::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.store.get(path)
    }

    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.store.get_as(path)
    }

    pub fn scan(&self, prefix: &str) -> Vec<(String, StateValue)> {
        self.store.scan(prefix)
    }

    /// Send a request to every matching handler and wait for them.
    ///
    /// Emits may run concurrently with each other (`emit` borrows `&self`);
    /// handlers of a single emit run sequentially. Returns how many
    /// handlers ran.
    pub async fn emit<T: Any + Send + Sync>(&self, path: &str, payload: T) -> usize {
        self.emit_arc(path, Arc::new(payload)).await
    }

    pub async fn emit_arc(&self, path: &str, payload: Payload) -> usize {
        self.router
            .dispatch(path, payload, Arc::clone(&self.store))
            .await
    }

    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.router.on(pattern, handler);
    }

    pub fn has_handler(&self, path: &str) -> bool {
        self.router.matches(path)
    }

    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        self.store.subscribe(pattern, handler)
    }

    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) -> bool {
        self.store.unsubscribe(pattern, id)
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }
}

impl Default for Flux {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct LikeReq {
        post_id: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Liked {
        post_id: String,
        count: u32,
    }

    #[tokio::test]
    async fn emit_handler_subscribe_round() {
        let flux = Flux::new();
        flux.on("post/like", |_, payload, store: Arc<StateStore>| async move {
            let req = match payload.downcast_ref::<LikeReq>() {
                Some(req) => req,
                None => return,
            };
            let path = format!("feed/reactions/{}", req.post_id);
            let count = store.get_as::<Liked>(&path).map_or(0, |l| l.count);
            store.set(&path, Liked { post_id: req.post_id.clone(), count: count + 1 });
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        flux.subscribe("feed/reactions/+", move |path, _| {
            s.lock().unwrap().push(path.to_string());
        });

        assert_eq!(flux.emit("post/like", LikeReq { post_id: "p1".into() }).await, 1);
        flux.emit("post/like", LikeReq { post_id: "p1".into() }).await;

        assert_eq!(
            flux.get_as::<Liked>("feed/reactions/p1"),
            Some(Liked { post_id: "p1".into(), count: 2 })
        );
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(flux.scan("feed/reactions").len(), 1);
    }

    #[tokio::test]
    async fn emit_without_handler_is_silent() {
        let flux = Flux::default();
        assert_eq!(flux.emit("nothing/here", ()).await, 0);
        assert!(!flux.has_handler("nothing/here"));
    }

    #[tokio::test]
    async fn concurrent_emits_interleave() {
        let flux = Flux::new();
        let started = Arc::new(AtomicU64::new(0));
        let s = started.clone();
        let gate = Arc::new(tokio::sync::Notify::new());
        let g = gate.clone();

        flux.on("slow", move |_, _, _| {
            let s = s.clone();
            let g = g.clone();
            async move {
                s.fetch_add(1, Ordering::SeqCst);
                g.notified().await;
            }
        });
        flux.on("fast", |_, _, store: Arc<StateStore>| async move {
            store.set("fast/done", true);
        });

        let slow = flux.emit("slow", ());
        let fast = async {
            flux.emit("fast", ()).await;
            assert_eq!(flux.get_as::<bool>("fast/done"), Some(true));
            gate.notify_one();
        };
        let (ran, _) = tokio::join!(slow, fast);
        assert_eq!(ran, 1);
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_through_facade() {
        let flux = Flux::new();
        let id = flux.subscribe("app/notice", |_, _| {});
        assert!(flux.unsubscribe("app/notice", id));
        assert!(!flux.unsubscribe("app/notice", id));
    }

    fn _assert_send_sync() {
        fn check<T: Send + Sync>() {}
        check::<Flux>();
    }
}
