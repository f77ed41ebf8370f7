//! Flat key/value configuration from the environment (`.env` honored by the
//! binary before this runs). Every knob has a default except the posting API
//! credentials, whose absence selects the dry-run publisher.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_INTERVAL_SECS: u64 = 7200;
pub const DEFAULT_MAX_POST_LEN: usize = 280;
pub const DEFAULT_NEWS_RSS_URL: &str =
    "https://timesofindia.indiatimes.com/rssfeedstopstories.cms";
pub const DEFAULT_FALLBACK_HEADLINE: &str = "news from home and around the world";

#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub max_post_len: usize,
    pub control_token: String,
    pub news_rss_url: String,
    pub news_api_url: Option<String>,
    pub fallback_headline: String,
    pub publish_api_url: Option<String>,
    pub publish_api_token: Option<String>,
    pub dedup_window: Option<Duration>,
    pub templates_path: Option<PathBuf>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let interval_secs = parse_or("POST_INTERVAL_SECS", DEFAULT_INTERVAL_SECS)?;
        let max_post_len = parse_or("MAX_POST_LEN", DEFAULT_MAX_POST_LEN)?;
        let port = parse_or("PORT", 8000u16)?;

        let dedup_window = match non_empty("DEDUP_WINDOW_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("DEDUP_WINDOW_SECS is not a number: {raw}"))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            interval: Duration::from_secs(interval_secs),
            max_post_len,
            control_token: non_empty("CONTROL_TOKEN").unwrap_or_else(|| "changeme".to_string()),
            news_rss_url: non_empty("NEWS_RSS_URL")
                .unwrap_or_else(|| DEFAULT_NEWS_RSS_URL.to_string()),
            news_api_url: non_empty("NEWS_API_URL"),
            fallback_headline: non_empty("FALLBACK_HEADLINE")
                .unwrap_or_else(|| DEFAULT_FALLBACK_HEADLINE.to_string()),
            publish_api_url: non_empty("PUBLISH_API_URL"),
            publish_api_token: non_empty("PUBLISH_API_TOKEN"),
            dedup_window,
            templates_path: non_empty("TEMPLATES_PATH").map(PathBuf::from),
            port,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} is not a valid value: {raw}")),
        None => Ok(default),
    }
}
