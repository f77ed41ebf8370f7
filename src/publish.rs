//! The outbound posting capability: a trait over `publish(text)` plus a
//! warm-up read of recently published items, with a structured failure
//! taxonomy so the scheduler can report without parsing strings.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

/// Structured publish failure. The scheduler reports these and moves on;
/// the next tick is the implicit retry.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("rate limited by the posting API")]
    RateLimited,
    #[error("posting API rejected the credentials")]
    Auth,
    #[error("posting API rejected the post: {0}")]
    Validation(String),
    #[error("transient posting failure: {0}")]
    Transient(String),
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), PublishError>;

    /// Recently published texts, newest first. Used once at startup to warm
    /// the dedup store; not part of the steady-state posting path.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<String>, PublishError>;

    fn name(&self) -> &'static str;
}

/// Short stable digest of a post text for logs and alerts, so full content
/// never ends up in log sinks.
pub fn text_digest(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// HTTP posting API client: `POST {base}/posts` with a JSON body and bearer
/// token, `GET {base}/posts/recent` for the warm-up read.
pub struct HttpPublisher {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RecentPost {
    text: String,
}

impl HttpPublisher {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(tok) => req.bearer_auth(tok),
            None => req,
        }
    }
}

#[async_trait::async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        let url = format!("{}/posts", self.base_url);
        let req = self
            .authorized(self.client.post(&url))
            .timeout(self.timeout)
            .json(&json!({ "text": text }));

        match req.send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err(classify_status(status, &body))
            }
            Err(e) => Err(PublishError::Transient(e.to_string())),
        }
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<String>, PublishError> {
        let url = format!("{}/posts/recent", self.base_url);
        let req = self
            .authorized(self.client.get(&url))
            .timeout(self.timeout)
            .query(&[("limit", limit)]);

        match req.send().await {
            Ok(resp) if resp.status().is_success() => {
                let posts: Vec<RecentPost> = resp
                    .json()
                    .await
                    .map_err(|e| PublishError::Transient(e.to_string()))?;
                Ok(posts.into_iter().map(|p| p.text).collect())
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                Err(classify_status(status, &body))
            }
            Err(e) => Err(PublishError::Transient(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn classify_status(status: reqwest::StatusCode, body: &str) -> PublishError {
    match status.as_u16() {
        401 | 403 => PublishError::Auth,
        429 => PublishError::RateLimited,
        400..=499 => PublishError::Validation(snippet(body)),
        _ => PublishError::Transient(format!("unexpected status {status}")),
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Publisher used when no posting credentials are configured: logs instead
/// of posting, so the service can run end-to-end in development.
pub struct DryRunPublisher;

#[async_trait::async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        tracing::info!(
            digest = %text_digest(text),
            chars = text.chars().count(),
            "dry-run publish (no posting API configured)"
        );
        Ok(())
    }

    async fn recent_posts(&self, _limit: usize) -> Result<Vec<String>, PublishError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
