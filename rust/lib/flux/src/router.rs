use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::store::StateStore;
use crate::trie::Trie;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Type-erased request payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

type ErasedHandler = Arc<dyn Fn(String, Payload, Arc<StateStore>) -> BoxFuture + Send + Sync>;

/// Routes request paths to async handlers through the topic trie.
///
/// Every handler whose pattern matches runs, one after another, in match
/// order. A path with no handler is dropped.
pub struct Router {
    handlers: Trie<ErasedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            handlers: Trie::new(),
        }
    }

    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let erased: ErasedHandler = Arc::new(
            move |path: String, payload: Payload, store: Arc<StateStore>| -> BoxFuture {
                Box::pin(handler(path, payload, store))
            },
        );
        self.handlers.insert(pattern, erased);
    }

    /// Run every handler matching `path`. Returns how many ran.
    pub async fn dispatch(&self, path: &str, payload: Payload, store: Arc<StateStore>) -> usize {
        let handlers = self.handlers.matches(path);
        if handlers.is_empty() {
            tracing::debug!(path, "no handler for request");
            return 0;
        }
        for handler in &handlers {
            handler(path.to_string(), Arc::clone(&payload), Arc::clone(&store)).await;
        }
        handlers.len()
    }

    pub fn matches(&self, path: &str) -> bool {
        !self.handlers.matches(path).is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    fn store() -> Arc<StateStore> {
        Arc::new(StateStore::new())
    }

    #[tokio::test]
    async fn dispatch_runs_matching_handler() {
        let router = Router::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = hits.clone();
        router.on("post/toggle-reaction", move |_, _, _| {
            let h = h.clone();
            async move {
                h.fetch_add(1, Ordering::Relaxed);
            }
        });

        assert_eq!(router.dispatch("post/toggle-reaction", Arc::new(()), store()).await, 1);
        assert_eq!(router.dispatch("post/show", Arc::new(()), store()).await, 0);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn handler_downcasts_payload_and_writes_state() {
        struct Req {
            post_id: String,
        }

        let router = Router::new();
        router.on("feed/snapshot", |_, payload, store: Arc<StateStore>| async move {
            if let Some(req) = payload.downcast_ref::<Req>() {
                store.set("feed/last", req.post_id.clone());
            }
        });

        let s = store();
        router
            .dispatch("feed/snapshot", Arc::new(Req { post_id: "p1".into() }), s.clone())
            .await;
        assert_eq!(s.get_as::<String>("feed/last"), Some("p1".to_string()));
    }

    #[tokio::test]
    async fn wildcard_handlers_run_in_order() {
        let router = Router::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        router.on("feed/refresh", move |_, _, _| {
            let o = o1.clone();
            async move { o.lock().unwrap().push("exact") }
        });
        router.on("feed/#", move |path, _, _| {
            let o = o2.clone();
            async move {
                assert_eq!(path, "feed/refresh");
                o.lock().unwrap().push("any");
            }
        });

        assert_eq!(router.dispatch("feed/refresh", Arc::new(()), store()).await, 2);
        assert_eq!(order.lock().unwrap().len(), 2);
        assert!(router.matches("feed/snapshot"));
        assert!(!router.matches("post/show"));
    }
}
