use std::time::Duration;

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::headlines::types::HeadlineSource;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
}

/// RSS 2.0 feed source. The newest (first) item's title is the candidate.
pub struct RssHeadlineSource {
    url: String,
    label: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RssHeadlineSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Pure parse step, exercised directly by tests.
    pub fn first_title(xml: &str) -> Result<String> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        for item in rss.channel.item {
            if let Some(title) = item.title {
                if !title.trim().is_empty() {
                    return Ok(title);
                }
            }
        }
        bail!("feed has no item with a usable title");
    }
}

#[async_trait::async_trait]
impl HeadlineSource for RssHeadlineSource {
    async fn fetch(&self) -> Result<String> {
        let body = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .context("feed returned non-2xx")?
            .text()
            .await
            .context("reading feed body")?;
        Self::first_title(&body)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

// Feeds routinely embed HTML entities that are not valid XML; replace the
// common ones before handing the document to the XML parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
