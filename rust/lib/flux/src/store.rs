use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::trie::Trie;
use crate::value::{StateValue, SubscriptionId};

/// Callback invoked with the changed path and its new value.
pub type ChangeHandler = Arc<dyn Fn(&str, &StateValue) + Send + Sync>;

/// Path-addressed state with trie-routed change notifications.
///
/// Values live in a `BTreeMap` so children of a prefix can be scanned in
/// order. Subscribers run synchronously on the writer's thread, after the
/// write lock is released, so a subscriber may read or write the store.
pub struct StateStore {
    values: RwLock<BTreeMap<String, StateValue>>,
    subscribers: Trie<Subscriber>,
    next_id: AtomicU64,
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    handler: ChangeHandler,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            subscribers: Trie::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store `value` at `path` and notify matching subscribers.
    pub fn set<T: Any + Send + Sync>(&self, path: &str, value: T) {
        self.set_value(path, StateValue::new(value));
    }

    pub fn set_value(&self, path: &str, value: StateValue) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), value.clone());
        self.notify(path, &value);
    }

    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Typed read: `None` when the path is unset or holds another type.
    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(|v| v.cloned::<T>())
    }

    /// Read-modify-write of a typed value under the store's write lock.
    ///
    /// `f` receives the current value (if any, and if of type `T`) and
    /// returns the replacement, or `None` to leave the path untouched.
    /// Subscribers are notified only when a value was written.
    pub fn update<T, F>(&self, path: &str, f: F) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
        F: FnOnce(Option<&T>) -> Option<T>,
    {
        let written = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            let current = values.get(path).and_then(|v| v.downcast_ref::<T>());
            let next = f(current)?;
            let value = StateValue::new(next.clone());
            values.insert(path.to_string(), value.clone());
            (next, value)
        };
        self.notify(path, &written.1);
        Some(written.0)
    }

    /// Remove the value at `path` without notifying.
    pub fn remove(&self, path: &str) -> Option<StateValue> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
    }

    /// Children of `prefix` (paths starting with `{prefix}/`), in path
    /// order. The prefix itself is not included.
    pub fn scan(&self, prefix: &str) -> Vec<(String, StateValue)> {
        let start = format!("{prefix}/");
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(start.clone()..)
            .take_while(|(k, _)| k.starts_with(&start))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register `handler` for every future write to a path matching
    /// `pattern` (`+`/`#` wildcards allowed).
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.insert(
            pattern,
            Subscriber {
                id,
                handler: Arc::new(handler),
            },
        );
        id
    }

    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) -> bool {
        self.subscribers.remove(pattern, |s| s.id == id)
    }

    fn notify(&self, path: &str, value: &StateValue) {
        for subscriber in self.subscribers.matches(path) {
            (subscriber.handler)(path, value);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Count(u32);

    #[test]
    fn set_then_get_typed() {
        let store = StateStore::new();
        store.set("feed/slots/0/reaction", Count(4));
        assert_eq!(store.get_as::<Count>("feed/slots/0/reaction"), Some(Count(4)));
        assert_eq!(store.get_as::<String>("feed/slots/0/reaction"), None);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn set_overwrites() {
        let store = StateStore::new();
        store.set("n", Count(1));
        store.set("n", Count(2));
        assert_eq!(store.get_as::<Count>("n"), Some(Count(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_reads_current_and_writes() {
        let store = StateStore::new();
        store.set("n", Count(1));
        let next = store.update::<Count, _>("n", |cur| cur.map(|c| Count(c.0 + 1)));
        assert_eq!(next, Some(Count(2)));
        assert_eq!(store.get_as::<Count>("n"), Some(Count(2)));
    }

    #[test]
    fn update_returning_none_leaves_value_and_skips_notify() {
        let store = StateStore::new();
        store.set("n", Count(1));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        store.subscribe("n", move |_, _| {
            h.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(store.update::<Count, _>("n", |_| None), None);
        assert_eq!(store.get_as::<Count>("n"), Some(Count(1)));
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn remove_does_not_notify() {
        let store = StateStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        store.subscribe("#", move |_, _| {
            h.fetch_add(1, Ordering::Relaxed);
        });
        store.set("a", Count(1));
        assert!(store.remove("a").is_some());
        assert!(!store.contains("a"));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn scan_lists_children_only() {
        let store = StateStore::new();
        store.set("feed/reactions", Count(0));
        store.set("feed/reactions/p1", Count(1));
        store.set("feed/reactions/p2", Count(2));
        store.set("feed/reactionsx", Count(9));

        let children = store.scan("feed/reactions");
        let paths: Vec<_> = children.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["feed/reactions/p1", "feed/reactions/p2"]);
    }

    #[test]
    fn wildcard_subscriber_sees_path_and_value() {
        let store = StateStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        store.subscribe("feed/reactions/+", move |path, value| {
            let c = value.cloned::<Count>().unwrap();
            s.lock().unwrap().push((path.to_string(), c.0));
        });

        store.set("feed/reactions/p1", Count(3));
        store.set("feed/page", Count(0));

        assert_eq!(*seen.lock().unwrap(), vec![("feed/reactions/p1".to_string(), 3)]);
    }

    #[test]
    fn subscriber_may_write_back_into_store() {
        let store = Arc::new(StateStore::new());
        let inner = store.clone();
        store.subscribe("feed/reactions/+", move |_, value| {
            let c = value.cloned::<Count>().unwrap();
            inner.set("feed/last", c);
        });
        store.set("feed/reactions/p1", Count(5));
        assert_eq!(store.get_as::<Count>("feed/last"), Some(Count(5)));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = StateStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = store.subscribe("app/notice", move |_, _| {
            h.fetch_add(1, Ordering::Relaxed);
        });
        store.set("app/notice", Count(1));
        assert!(store.unsubscribe("app/notice", id));
        store.set("app/notice", Count(2));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
