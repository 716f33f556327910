#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use closet_client::{ApiError, PostSnapshot, PostsApi, ReactionApi};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Add,
    Remove,
}

/// In-memory reaction backend. Holds the authoritative liked flag and
/// count per post and answers 409 the way the real endpoint does.
pub struct FakeServer {
    posts: Mutex<BTreeMap<String, (bool, u32)>>,
    calls: Mutex<Vec<(String, Call)>>,
    /// Index of the first reaction call that fails.
    fail_from: AtomicUsize,
    fail_feed: AtomicBool,
    hold: AtomicBool,
    release: Notify,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            posts: Mutex::default(),
            calls: Mutex::default(),
            fail_from: AtomicUsize::new(usize::MAX),
            fail_feed: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            release: Notify::new(),
        })
    }

    pub fn with_post(self: Arc<Self>, id: &str, liked: bool, likes: u32) -> Arc<Self> {
        self.posts.lock().unwrap().insert(id.to_string(), (liked, likes));
        self
    }

    pub fn post(&self, id: &str) -> PostSnapshot {
        let (liked, likes) = self.posts.lock().unwrap()[id];
        PostSnapshot::new(id, liked, likes)
    }

    pub fn set_post(&self, id: &str, liked: bool, likes: u32) {
        self.posts.lock().unwrap().insert(id.to_string(), (liked, likes));
    }

    pub fn calls(&self) -> Vec<(String, Call)> {
        self.calls.lock().unwrap().clone()
    }

    /// Fail every reaction request with HTTP 500.
    pub fn fail_reactions(&self) {
        self.fail_from_call(0);
    }

    /// Fail reaction requests from the `n`th (0-based) on.
    pub fn fail_from_call(&self, n: usize) {
        self.fail_from.store(n, Ordering::SeqCst);
    }

    pub fn fail_feed(&self, on: bool) {
        self.fail_feed.store(on, Ordering::SeqCst);
    }

    /// Keep reaction requests in flight until `release` is called.
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    async fn react(&self, post_id: &str, call: Call) -> Result<(), ApiError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((post_id.to_string(), call));
            calls.len() - 1
        };
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if index >= self.fail_from.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 500,
                message: "database unavailable".into(),
            });
        }
        let mut posts = self.posts.lock().unwrap();
        let entry = posts.entry(post_id.to_string()).or_insert((false, 0));
        let like = call == Call::Add;
        if entry.0 == like {
            let msg = if like { "already reacted" } else { "not reacted" };
            return Err(ApiError::Conflict(msg.into()));
        }
        entry.0 = like;
        entry.1 = if like { entry.1 + 1 } else { entry.1.saturating_sub(1) };
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReactionApi for FakeServer {
    async fn add_reaction(&self, post_id: &str) -> Result<(), ApiError> {
        self.react(post_id, Call::Add).await
    }

    async fn remove_reaction(&self, post_id: &str) -> Result<(), ApiError> {
        self.react(post_id, Call::Remove).await
    }
}

#[async_trait::async_trait]
impl PostsApi for FakeServer {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<Vec<PostSnapshot>, ApiError> {
        if self.fail_feed.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 503,
                message: "busy".into(),
            });
        }
        let posts = self.posts.lock().unwrap();
        let skip = (page.saturating_sub(1) * limit) as usize;
        Ok(posts
            .iter()
            .skip(skip)
            .take(limit as usize)
            .map(|(id, (liked, likes))| PostSnapshot::new(id.as_str(), *liked, *likes))
            .collect())
    }

    async fn get_post(&self, post_id: &str) -> Result<PostSnapshot, ApiError> {
        let posts = self.posts.lock().unwrap();
        match posts.get(post_id) {
            Some((liked, likes)) => Ok(PostSnapshot::new(post_id, *liked, *likes)),
            None => Err(ApiError::Server {
                status: 404,
                message: "no such post".into(),
            }),
        }
    }
}
