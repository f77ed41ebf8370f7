//! Dedup store: remembers previously published text and gates re-publication.
//!
//! Membership is exact-text. Retention is process-lifetime by default; an
//! optional TTL window can be layered on without changing the interface.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::publish::Publisher;

/// One successfully published text. Created once, never mutated.
#[derive(Debug, Clone)]
pub struct PublishedRecord {
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    seen: HashSet<String>,
    // Append-only, oldest first; pruned from the front when a window is set.
    log: VecDeque<PublishedRecord>,
}

#[derive(Debug)]
pub struct DedupStore {
    inner: Mutex<Inner>,
    window: Option<Duration>,
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupStore {
    /// Process-lifetime retention.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            window: None,
        }
    }

    /// Retain records only for `window`; older entries stop gating.
    pub fn with_window(window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            window: Some(window),
        }
    }

    pub fn seen(&self, text: &str) -> bool {
        let mut inner = self.inner.lock().expect("dedup mutex poisoned");
        self.prune(&mut inner, Utc::now());
        inner.seen.contains(text)
    }

    /// Record a published text at the current time. Idempotent.
    pub fn record(&self, text: &str) {
        self.record_at(text, Utc::now());
    }

    /// Record with an explicit timestamp (warm-up and tests).
    pub fn record_at(&self, text: &str, ts: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("dedup mutex poisoned");
        self.prune(&mut inner, ts);
        if inner.seen.insert(text.to_string()) {
            inner.log.push_back(PublishedRecord {
                text: text.to_string(),
                recorded_at: ts,
            });
        }
    }

    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock().expect("dedup mutex poisoned");
        self.prune(&mut inner, Utc::now());
        inner.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, inner: &mut Inner, now: DateTime<Utc>) {
        let Some(window) = self.window else { return };
        let Ok(window) = chrono::Duration::from_std(window) else {
            return;
        };
        let cutoff = now - window;
        while let Some(front) = inner.log.front() {
            if front.recorded_at < cutoff {
                let expired = inner.log.pop_front().expect("front checked above");
                inner.seen.remove(&expired.text);
            } else {
                break;
            }
        }
    }

    /// One-time startup read of the publish capability's recent items, so a
    /// restart does not repeat what the account already posted. Failures are
    /// logged and ignored; an empty store is a valid starting point.
    pub async fn warm_up(&self, publisher: &dyn Publisher, limit: usize) {
        match publisher.recent_posts(limit).await {
            Ok(posts) => {
                for text in &posts {
                    self.record(text);
                }
                tracing::info!(
                    publisher = publisher.name(),
                    recorded = posts.len(),
                    "dedup store warmed up from recent posts"
                );
            }
            Err(e) => {
                tracing::warn!(publisher = publisher.name(), error = %e, "dedup warm-up failed");
            }
        }
    }
}
