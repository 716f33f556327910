use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Topic trie with MQTT-style wildcards, shared by subscriptions and
/// request handlers.
///
/// - `+` matches exactly one level: `feed/slots/+/reaction`
/// - `#` matches the rest of the topic, including nothing: `feed/#`
///
/// Levels are separated by `/`.
pub struct Trie<T> {
    root: RwLock<Node<T>>,
}

struct Node<T> {
    children: HashMap<String, Node<T>>,
    one: Option<Box<Node<T>>>,
    rest: Vec<T>,
    values: Vec<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            one: None,
            rest: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone> Trie<T> {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::default()),
        }
    }

    /// Register `value` under `pattern`. A `#` segment ends the pattern.
    pub fn insert(&self, pattern: &str, value: T) {
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        let mut node = &mut *root;
        for segment in pattern.split('/') {
            match segment {
                "#" => {
                    node.rest.push(value);
                    return;
                }
                "+" => node = &mut **node.one.get_or_insert_with(Box::default),
                s => node = node.children.entry(s.to_string()).or_default(),
            }
        }
        node.values.push(value);
    }

    /// Every value whose pattern matches the concrete `topic`, in
    /// exact, `+`, `#` order per level.
    pub fn matches(&self, topic: &str) -> Vec<T> {
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        let segments: Vec<&str> = topic.split('/').collect();
        let mut out = Vec::new();
        root.collect(&segments, &mut out);
        out
    }

    /// Drop values registered under exactly `pattern` for which `predicate`
    /// holds. Returns whether anything was removed.
    pub fn remove<F>(&self, pattern: &str, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        let mut node = &mut *root;
        let mut segments = pattern.split('/');
        let bucket = loop {
            match segments.next() {
                None => break &mut node.values,
                Some("#") => break &mut node.rest,
                Some("+") => match node.one.as_deref_mut() {
                    Some(next) => node = next,
                    None => return false,
                },
                Some(s) => match node.children.get_mut(s) {
                    Some(next) => node = next,
                    None => return false,
                },
            }
        };
        let before = bucket.len();
        bucket.retain(|v| !predicate(v));
        bucket.len() < before
    }

    pub fn is_empty(&self) -> bool {
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        root.is_empty()
    }
}

impl<T: Clone> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Node<T> {
    fn collect(&self, segments: &[&str], out: &mut Vec<T>) {
        // `#` also matches zero remaining levels.
        out.extend(self.rest.iter().cloned());

        let Some((first, tail)) = segments.split_first() else {
            out.extend(self.values.iter().cloned());
            return;
        };
        if let Some(child) = self.children.get(*first) {
            child.collect(tail, out);
        }
        if let Some(one) = &self.one {
            one.collect(tail, out);
        }
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.rest.is_empty()
            && self.one.as_ref().map_or(true, |n| n.is_empty())
            && self.children.values().all(Node::is_empty)
    }
}
