// src/headlines/mod.rs
pub mod providers;
pub mod types;

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::headlines::types::HeadlineSource;

/// Ordered fallback chain over headline sources.
///
/// Sources are tried strictly in priority order; the first usable result
/// wins and the rest are never contacted. Per-source failures stay inside
/// the chain. When every source fails, the configured fallback text is
/// substituted, so callers always get a non-empty headline.
pub struct HeadlineChain {
    sources: Vec<Box<dyn HeadlineSource>>,
    fallback: String,
}

impl HeadlineChain {
    pub fn new(sources: Vec<Box<dyn HeadlineSource>>, fallback: impl Into<String>) -> Self {
        Self {
            sources,
            fallback: fallback.into(),
        }
    }

    pub async fn fetch_headline(&self) -> String {
        for src in &self.sources {
            match src.fetch().await {
                Ok(raw) => {
                    let cleaned = clean_headline(&raw);
                    if cleaned.is_empty() {
                        tracing::warn!(source = src.name(), "source returned an empty headline");
                        counter!("headline_source_errors_total").increment(1);
                        continue;
                    }
                    tracing::debug!(source = src.name(), "headline fetched");
                    return cleaned;
                }
                Err(e) => {
                    tracing::warn!(source = src.name(), error = ?e, "headline source failed");
                    counter!("headline_source_errors_total").increment(1);
                }
            }
        }

        tracing::warn!("all headline sources failed; using fallback text");
        counter!("headline_fallback_total").increment(1);
        self.fallback.clone()
    }
}

/// Normalize a raw feed title into post-ready text: decode HTML entities,
/// strip tags, URLs, `#hashtags`/`@mentions` and trailing source boilerplate,
/// then collapse whitespace.
pub fn clean_headline(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_URLS: OnceCell<Regex> = OnceCell::new();
    let re_urls = RE_URLS.get_or_init(|| Regex::new(r"https?://\S+").unwrap());
    out = re_urls.replace_all(&out, "").to_string();

    static RE_SOCIAL: OnceCell<Regex> = OnceCell::new();
    let re_social = RE_SOCIAL.get_or_init(|| Regex::new(r"[#@]\w+").unwrap());
    out = re_social.replace_all(&out, "").to_string();

    // Trailing "- Some Outlet" / "| Some Outlet" credit, once.
    static RE_CREDIT: OnceCell<Regex> = OnceCell::new();
    let re_credit = RE_CREDIT.get_or_init(|| Regex::new(r"\s+[-|]\s+[^-|]+$").unwrap());
    out = re_credit.replace(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_markup_links_and_social_noise() {
        let raw = "<b>Rates&nbsp;hold steady</b> says bank https://example.com/x #markets @desk";
        assert_eq!(clean_headline(raw), "Rates hold steady says bank");
    }

    #[test]
    fn clean_drops_trailing_outlet_credit() {
        assert_eq!(
            clean_headline("Monsoon arrives early this year - The Daily Bugle"),
            "Monsoon arrives early this year"
        );
        assert_eq!(
            clean_headline("Monsoon arrives early this year | Bugle News"),
            "Monsoon arrives early this year"
        );
    }

    #[test]
    fn clean_collapses_whitespace() {
        assert_eq!(clean_headline("  spaced \t out\n title  "), "spaced out title");
    }

    #[test]
    fn plain_titles_pass_through() {
        assert_eq!(
            clean_headline("A very long headline text that overflows"),
            "A very long headline text that overflows"
        );
    }
}
