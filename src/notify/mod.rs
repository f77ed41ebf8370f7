pub mod webhook;

use chrono::{DateTime, Utc};

use crate::publish::PublishError;
use webhook::WebhookNotifier;

/// What gets forwarded to the alerting channel when a publish fails.
/// Carries a digest of the text rather than the text itself.
#[derive(Debug, Clone)]
pub struct PublishFailureAlert {
    pub publisher: &'static str,
    pub error: String,
    pub text_digest: String,
    pub ts: DateTime<Utc>,
}

impl PublishFailureAlert {
    pub fn new(publisher: &'static str, error: &PublishError, text_digest: String) -> Self {
        Self {
            publisher,
            error: error.to_string(),
            text_digest,
            ts: Utc::now(),
        }
    }
}

/// Alert fan-out. Channels missing from the environment are simply disabled;
/// a failed alert send is logged and never propagates into the posting loop.
pub struct Alerts {
    webhook: Option<WebhookNotifier>,
}

impl Alerts {
    /// Reads `ALERT_WEBHOOK_URL`; alerts are disabled when it is unset.
    pub fn from_env() -> Self {
        Self {
            webhook: std::env::var("ALERT_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(WebhookNotifier::new),
        }
    }

    pub fn disabled() -> Self {
        Self { webhook: None }
    }

    pub async fn publish_failure(&self, alert: &PublishFailureAlert) {
        let Some(webhook) = &self.webhook else {
            tracing::debug!("alerts disabled (no ALERT_WEBHOOK_URL)");
            return;
        };
        if let Err(e) = webhook.send(alert).await {
            tracing::warn!(error = ?e, "failed to deliver publish-failure alert");
        }
    }
}
