//! The posting loop and its controls.
//!
//! One background task runs a posting attempt per interval while automation
//! is enabled. The control surface flips the flag (`pause`/`resume`) and can
//! force an attempt (`trigger_now`) or push raw text (`publish_raw`); every
//! attempt goes through the same serialized compose -> dedup -> publish ->
//! record pipeline, so concurrent callers cannot double-post the same text.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::compose::Composer;
use crate::dedup::DedupStore;
use crate::metrics::ensure_metrics_described;
use crate::notify::{Alerts, PublishFailureAlert};
use crate::publish::{text_digest, PublishError, Publisher};

/// Result of one posting attempt.
#[derive(Debug)]
pub enum PostOutcome {
    Published(String),
    /// Dedup gate closed; a silent no-op, not an error.
    Duplicate(String),
    Failed {
        text: String,
        error: PublishError,
    },
}

pub struct Scheduler {
    enabled: AtomicBool,
    interval: Duration,
    composer: Arc<Composer>,
    dedup: Arc<DedupStore>,
    publisher: Arc<dyn Publisher>,
    alerts: Arc<Alerts>,
    // Serializes whole attempts, including manual ones.
    attempt_lock: tokio::sync::Mutex<()>,
}

impl Scheduler {
    pub fn new(
        interval: Duration,
        composer: Arc<Composer>,
        dedup: Arc<DedupStore>,
        publisher: Arc<dyn Publisher>,
        alerts: Arc<Alerts>,
    ) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            interval,
            composer,
            dedup,
            publisher,
            alerts,
            attempt_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Idempotent. Pausing does not interrupt a sleep already in progress;
    /// it makes the next tick skip its attempt.
    pub fn pause(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            tracing::info!("automation paused");
        }
        gauge!("automation_enabled").set(0.0);
    }

    /// Idempotent.
    pub fn resume(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            tracing::info!("automation resumed");
        }
        gauge!("automation_enabled").set(1.0);
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    /// Run one composer-driven attempt now, regardless of the enabled flag.
    pub async fn trigger_now(&self) -> PostOutcome {
        let _guard = self.attempt_lock.lock().await;
        let text = self.composer.compose().await;
        self.attempt(text).await
    }

    /// Publish caller-supplied text, still dedup-gated.
    pub async fn publish_raw(&self, text: String) -> PostOutcome {
        let _guard = self.attempt_lock.lock().await;
        self.attempt(text).await
    }

    // Caller must hold `attempt_lock`.
    async fn attempt(&self, text: String) -> PostOutcome {
        ensure_metrics_described();
        counter!("post_attempts_total").increment(1);
        gauge!("post_last_attempt_ts").set(chrono::Utc::now().timestamp() as f64);

        let digest = text_digest(&text);
        if self.dedup.seen(&text) {
            tracing::debug!(%digest, "candidate already published; skipping");
            counter!("posts_deduped_total").increment(1);
            return PostOutcome::Duplicate(text);
        }

        match self.publisher.publish(&text).await {
            Ok(()) => {
                self.dedup.record(&text);
                tracing::info!(
                    %digest,
                    publisher = self.publisher.name(),
                    chars = text.chars().count(),
                    "post published"
                );
                counter!("posts_published_total").increment(1);
                PostOutcome::Published(text)
            }
            Err(error) => {
                tracing::error!(%digest, %error, "publish failed");
                counter!("publish_failures_total").increment(1);
                let alert =
                    PublishFailureAlert::new(self.publisher.name(), &error, digest.clone());
                self.alerts.publish_failure(&alert).await;
                PostOutcome::Failed { text, error }
            }
        }
    }

    /// The posting loop. Ticks once per interval (first tick fires right
    /// away), attempts only while enabled, and exits only when the shutdown
    /// channel fires or closes.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "posting loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.is_enabled() {
                        tracing::debug!("automation paused; tick skipped");
                        continue;
                    }
                    // Outcomes are logged and counted inside the attempt; a
                    // failure never stops the loop.
                    let _ = self.trigger_now().await;
                }
                _ = shutdown.changed() => {
                    tracing::info!("shutdown signal received; posting loop stopping");
                    return;
                }
            }
        }
    }
}
