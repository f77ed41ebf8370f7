use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("post_attempts_total", "Posting attempts, any outcome.");
        describe_counter!("posts_published_total", "Posts accepted by the posting API.");
        describe_counter!(
            "posts_deduped_total",
            "Attempts skipped because the text was already published."
        );
        describe_counter!("publish_failures_total", "Posting API failures.");
        describe_counter!(
            "headline_source_errors_total",
            "Headline source fetch/parse errors."
        );
        describe_counter!(
            "headline_fallback_total",
            "Times all headline sources failed and the fallback text was used."
        );
        describe_gauge!("automation_enabled", "1 when the posting loop is enabled.");
        describe_gauge!("post_last_attempt_ts", "Unix ts of the last posting attempt.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and seed the automation gauge.
    pub fn init() -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();
        gauge!("automation_enabled").set(1.0);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
