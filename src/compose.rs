//! Composer: turns the topic catalog (plus a live headline when the chosen
//! topic calls for one) into a single candidate post, hashtag suffix and
//! length clamp included.
//!
//! All selection is uniformly random through one seedable RNG, so tests can
//! pin the whole composition down with `with_seed`.

use std::sync::Arc;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::headlines::HeadlineChain;
use crate::templates::{TemplateBank, TemplateGroup, Topic, HEADLINE_PLACEHOLDER};

/// At most this many hashtags are appended to a post.
const MAX_HASHTAGS: usize = 2;

pub struct Composer {
    bank: Arc<TemplateBank>,
    chain: Arc<HeadlineChain>,
    max_len: usize,
    rng: Mutex<StdRng>,
}

// First stage of composition: everything decided under the RNG lock, with
// the headline fetch (the only await point) deferred until the lock is gone.
enum Draft {
    Ready(String),
    NeedsHeadline(String),
}

impl Composer {
    pub fn new(bank: Arc<TemplateBank>, chain: Arc<HeadlineChain>, max_len: usize) -> Self {
        Self {
            bank,
            chain,
            max_len,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic composer for tests.
    pub fn with_seed(
        bank: Arc<TemplateBank>,
        chain: Arc<HeadlineChain>,
        max_len: usize,
        seed: u64,
    ) -> Self {
        Self {
            bank,
            chain,
            max_len,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Build one candidate post. Always non-empty, never longer than
    /// `max_len` characters.
    pub async fn compose(&self) -> String {
        let (topic, draft) = {
            let mut rng = self.rng.lock().expect("composer rng poisoned");
            let topic = self
                .bank
                .topics()
                .choose(&mut *rng)
                .expect("template bank is validated non-empty");
            (topic, draft_text(topic, &mut rng))
        };

        let mut text = match draft {
            Draft::Ready(text) => text,
            Draft::NeedsHeadline(template) => {
                let headline = self.chain.fetch_headline().await;
                template.replace(HEADLINE_PLACEHOLDER, &headline)
            }
        };

        if !topic.hashtags.is_empty() {
            let suffix = {
                let mut rng = self.rng.lock().expect("composer rng poisoned");
                sample_hashtags(&topic.hashtags, &mut rng)
            };
            // Soft constraint: either the whole suffix fits, or no tags at all.
            if chars(&text) + 1 + chars(&suffix) <= self.max_len {
                text.push(' ');
                text.push_str(&suffix);
            }
        }

        truncate_with_ellipsis(&text, self.max_len)
    }
}

fn draft_text(topic: &Topic, rng: &mut StdRng) -> Draft {
    match &topic.group {
        TemplateGroup::Standalone(texts) => Draft::Ready(
            texts
                .choose(rng)
                .expect("standalone group validated non-empty")
                .clone(),
        ),
        TemplateGroup::Headline(templates) => Draft::NeedsHeadline(
            templates
                .choose(rng)
                .expect("headline group validated non-empty")
                .clone(),
        ),
        TemplateGroup::Composed(parts) => {
            let mut pieces = Vec::with_capacity(parts.len());
            for part in parts {
                pieces.push(
                    part.fragments
                        .choose(rng)
                        .expect("part validated non-empty")
                        .as_str(),
                );
            }
            Draft::Ready(pieces.join(" "))
        }
    }
}

fn sample_hashtags(hashtags: &[String], rng: &mut StdRng) -> String {
    let count = rng.random_range(1..=hashtags.len().min(MAX_HASHTAGS));
    hashtags
        .choose_multiple(rng, count)
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tail-truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if chars(text) <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn chars(s: &str) -> usize {
    s.chars().count()
}
