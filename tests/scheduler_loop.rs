// tests/scheduler_loop.rs
//
// Scheduler behavior: pause/resume gating of the timed loop, dedup gating
// of attempts, serialization of concurrent triggers, and failure handling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use headline_poster::compose::Composer;
use headline_poster::dedup::DedupStore;
use headline_poster::headlines::HeadlineChain;
use headline_poster::notify::Alerts;
use headline_poster::publish::{PublishError, Publisher};
use headline_poster::scheduler::{PostOutcome, Scheduler};
use headline_poster::templates::TemplateBank;

#[derive(Default)]
struct RecordingPublisher {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingPublisher {
    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, _text: &str) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PublishError::Transient("wire down".into()))
        } else {
            Ok(())
        }
    }

    async fn recent_posts(&self, _limit: usize) -> Result<Vec<String>, PublishError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// One topic, one template: every attempt composes the same candidate, so
// dedup makes publish counts deterministic regardless of tick counts.
const SINGLE_CANDIDATE: &str = r#"
    [[topics]]
    name = "only"
    templates = ["The one and only post."]
"#;

fn scheduler_with(
    publisher: Arc<RecordingPublisher>,
    interval: Duration,
) -> Arc<Scheduler> {
    let bank = Arc::new(TemplateBank::from_toml_str(SINGLE_CANDIDATE).unwrap());
    let chain = Arc::new(HeadlineChain::new(Vec::new(), "fallback"));
    let composer = Arc::new(Composer::with_seed(bank, chain, 280, 42));
    Arc::new(Scheduler::new(
        interval,
        composer,
        Arc::new(DedupStore::new()),
        publisher,
        Arc::new(Alerts::disabled()),
    ))
}

#[tokio::test]
async fn paused_loop_never_publishes_and_resume_recovers() {
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(Arc::clone(&publisher), Duration::from_millis(30));

    scheduler.pause();
    scheduler.pause(); // idempotent

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(publisher.count(), 0, "paused loop must not publish");
    assert!(!scheduler.is_enabled());

    scheduler.resume();
    scheduler.resume(); // idempotent
    tokio::time::sleep(Duration::from_millis(120)).await;
    // Several ticks passed, but the single candidate dedups to one publish.
    assert_eq!(publisher.count(), 1);
    assert!(scheduler.is_enabled());

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop exits on shutdown")
        .unwrap();
}

#[tokio::test]
async fn dedup_gated_attempt_makes_no_publish_call() {
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(Arc::clone(&publisher), Duration::from_secs(3600));

    scheduler.dedup().record("The one and only post.");

    match scheduler.trigger_now().await {
        PostOutcome::Duplicate(text) => assert_eq!(text, "The one and only post."),
        other => panic!("expected duplicate, got {other:?}"),
    }
    assert_eq!(publisher.count(), 0);
}

#[tokio::test]
async fn trigger_now_works_while_paused() {
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(Arc::clone(&publisher), Duration::from_secs(3600));

    scheduler.pause();
    match scheduler.trigger_now().await {
        PostOutcome::Published(text) => assert_eq!(text, "The one and only post."),
        other => panic!("expected publish, got {other:?}"),
    }
    assert_eq!(publisher.count(), 1);
}

#[tokio::test]
async fn concurrent_triggers_for_the_same_candidate_publish_once() {
    let publisher = Arc::new(RecordingPublisher::default());
    let scheduler = scheduler_with(Arc::clone(&publisher), Duration::from_secs(3600));

    let (a, b) = tokio::join!(scheduler.trigger_now(), scheduler.trigger_now());

    assert_eq!(publisher.count(), 1, "attempts must be serialized");
    let outcomes = [a, b];
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, PostOutcome::Published(_)))
            .count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, PostOutcome::Duplicate(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn publish_failure_is_reported_not_recorded_and_retried_next_attempt() {
    let publisher = Arc::new(RecordingPublisher::failing());
    let scheduler = scheduler_with(Arc::clone(&publisher), Duration::from_secs(3600));

    match scheduler.trigger_now().await {
        PostOutcome::Failed { error, .. } => {
            assert!(matches!(error, PublishError::Transient(_)))
        }
        other => panic!("expected failure, got {other:?}"),
    }
    // Not recorded, so the next attempt tries the wire again.
    assert!(scheduler.dedup().is_empty());
    let _ = scheduler.trigger_now().await;
    assert_eq!(publisher.count(), 2);
}

#[tokio::test]
async fn loop_survives_publish_failures() {
    let publisher = Arc::new(RecordingPublisher::failing());
    let scheduler = scheduler_with(Arc::clone(&publisher), Duration::from_millis(30));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(
        publisher.count() >= 2,
        "failing ticks keep coming, got {}",
        publisher.count()
    );

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop exits on shutdown")
        .unwrap();
}
