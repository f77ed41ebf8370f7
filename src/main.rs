//! Posting Scheduler — Binary Entrypoint
//! Boots the Axum control surface, warms the dedup store, and spawns the
//! background posting loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headline_poster::api::{self, AppState};
use headline_poster::compose::Composer;
use headline_poster::config::Config;
use headline_poster::dedup::DedupStore;
use headline_poster::headlines::providers::{news_api::NewsApiSource, rss::RssHeadlineSource};
use headline_poster::headlines::types::HeadlineSource;
use headline_poster::headlines::HeadlineChain;
use headline_poster::metrics::Metrics;
use headline_poster::notify::Alerts;
use headline_poster::publish::{DryRunPublisher, HttpPublisher, Publisher};
use headline_poster::scheduler::Scheduler;
use headline_poster::templates::TemplateBank;

/// Recent items pulled from the posting API to seed the dedup store.
const WARM_UP_LIMIT: usize = 20;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_poster=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_chain(cfg: &Config) -> HeadlineChain {
    let mut sources: Vec<Box<dyn HeadlineSource>> = vec![Box::new(RssHeadlineSource::new(
        cfg.news_rss_url.clone(),
        "rss",
    ))];
    if let Some(url) = &cfg.news_api_url {
        sources.push(Box::new(NewsApiSource::new(url.clone(), "news-api")));
    }
    HeadlineChain::new(sources, cfg.fallback_headline.clone())
}

fn build_publisher(cfg: &Config) -> Arc<dyn Publisher> {
    match &cfg.publish_api_url {
        Some(url) => Arc::new(HttpPublisher::new(
            url.clone(),
            cfg.publish_api_token.clone(),
        )),
        None => {
            tracing::warn!("PUBLISH_API_URL not set; running with the dry-run publisher");
            Arc::new(DryRunPublisher)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env()?;
    let metrics = Metrics::init();

    let bank = Arc::new(TemplateBank::load(cfg.templates_path.as_deref())?);
    let chain = Arc::new(build_chain(&cfg));
    let publisher = build_publisher(&cfg);

    let dedup = Arc::new(match cfg.dedup_window {
        Some(window) => DedupStore::with_window(window),
        None => DedupStore::new(),
    });
    dedup.warm_up(publisher.as_ref(), WARM_UP_LIMIT).await;

    let composer = Arc::new(Composer::new(bank, chain, cfg.max_post_len));
    let scheduler = Arc::new(Scheduler::new(
        cfg.interval,
        composer,
        dedup,
        publisher,
        Arc::new(Alerts::from_env()),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(Arc::clone(&scheduler).run(shutdown_rx));

    let state = AppState {
        scheduler,
        control_token: Arc::new(cfg.control_token.clone()),
    };
    let app = api::router(state).merge(metrics.router());

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "control surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("serving control surface")?;

    Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = ?e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("ctrl-c received; shutting down");
    let _ = shutdown_tx.send(true);
}
