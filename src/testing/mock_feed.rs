//! Scriptable in-memory feed source.
//!
//! Counts every fetch, can answer with a fixed payload, a queue of scripted
//! results, or a simulated upstream latency.

use crate::{
    error::{FeedError, Result},
    feed::FeedSource,
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

pub struct MockFeedSource {
    payload: Mutex<Result<String>>,
    scripted: Mutex<VecDeque<Result<String>>>,
    latency: Mutex<Duration>,
    fetches: AtomicUsize,
}

impl MockFeedSource {
    /// A source that always answers with `xml`.
    pub fn new(xml: &str) -> Self {
        Self {
            payload: Mutex::new(Ok(xml.to_string())),
            scripted: Mutex::new(VecDeque::new()),
            latency: Mutex::new(Duration::ZERO),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A source whose every fetch fails with `error`.
    pub fn failing(error: FeedError) -> Self {
        let source = Self::new("");
        source.set_result(Err(error));
        source
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Replaces the standing answer used once the script is exhausted.
    pub fn set_result(&self, result: Result<String>) {
        *lock(&self.payload) = result;
    }

    pub fn set_payload(&self, xml: &str) {
        self.set_result(Ok(xml.to_string()));
    }

    /// Queues a one-shot answer, consumed before the standing answer.
    pub fn push_result(&self, result: Result<String>) {
        lock(&self.scripted).push_back(result);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl FeedSource for MockFeedSource {
    async fn fetch_raw(&self) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(next) = lock(&self.scripted).pop_front() {
            return next;
        }
        lock(&self.payload).clone()
    }

    fn describe(&self) -> String {
        "mock://feed".to_string()
    }
}
