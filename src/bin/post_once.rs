//! One-shot mode for cron/CI schedulers: compose a single post, publish it,
//! and exit non-zero on failure so the outer scheduler surfaces the error.

use std::sync::Arc;

use anyhow::{bail, Result};

use headline_poster::compose::Composer;
use headline_poster::config::Config;
use headline_poster::headlines::providers::{news_api::NewsApiSource, rss::RssHeadlineSource};
use headline_poster::headlines::types::HeadlineSource;
use headline_poster::headlines::HeadlineChain;
use headline_poster::publish::{text_digest, DryRunPublisher, HttpPublisher, Publisher};
use headline_poster::templates::TemplateBank;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::from_env()?;
    let bank = Arc::new(TemplateBank::load(cfg.templates_path.as_deref())?);

    let mut sources: Vec<Box<dyn HeadlineSource>> = vec![Box::new(RssHeadlineSource::new(
        cfg.news_rss_url.clone(),
        "rss",
    ))];
    if let Some(url) = &cfg.news_api_url {
        sources.push(Box::new(NewsApiSource::new(url.clone(), "news-api")));
    }
    let chain = Arc::new(HeadlineChain::new(sources, cfg.fallback_headline.clone()));

    let publisher: Box<dyn Publisher> = match &cfg.publish_api_url {
        Some(url) => Box::new(HttpPublisher::new(
            url.clone(),
            cfg.publish_api_token.clone(),
        )),
        None => {
            tracing::warn!("PUBLISH_API_URL not set; dry-run only");
            Box::new(DryRunPublisher)
        }
    };

    let composer = Composer::new(bank, chain, cfg.max_post_len);
    let text = composer.compose().await;
    tracing::info!(digest = %text_digest(&text), chars = text.chars().count(), "posting");

    if let Err(e) = publisher.publish(&text).await {
        bail!("publish failed: {e}");
    }

    println!("posted: {text}");
    Ok(())
}
