// tests/compose_props.rs
//
// Properties of the composer: output length, part ordering, headline
// interpolation, hashtag soft constraint, and the truncation rule.

use std::sync::Arc;

use anyhow::Result;

use headline_poster::compose::{truncate_with_ellipsis, Composer};
use headline_poster::headlines::types::HeadlineSource;
use headline_poster::headlines::HeadlineChain;
use headline_poster::templates::TemplateBank;

struct FixedSource(&'static str);

#[async_trait::async_trait]
impl HeadlineSource for FixedSource {
    async fn fetch(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
    fn name(&self) -> &str {
        "fixed"
    }
}

fn empty_chain() -> Arc<HeadlineChain> {
    Arc::new(HeadlineChain::new(Vec::new(), "stand-in headline"))
}

fn bank(toml: &str) -> Arc<TemplateBank> {
    Arc::new(TemplateBank::from_toml_str(toml).expect("test catalog parses"))
}

#[tokio::test]
async fn output_never_exceeds_max_len_for_any_topic() {
    let bank = bank(
        r#"
        [[topics]]
        name = "short"
        hashtags = ["#one", "#two", "#three"]
        templates = ["A brief note."]

        [[topics]]
        name = "long"
        hashtags = ["#long"]
        templates = ["This standalone template is deliberately written to be much longer than the tiny maximum we configure for this property test, so truncation must kick in."]

        [[topics]]
        name = "headline"
        templates = ["Now: {headline}"]

        [[topics]]
        name = "composed"
        [[topics.parts]]
        name = "line1"
        fragments = ["First sentence of the composed form."]
        [[topics.parts]]
        name = "line2"
        fragments = ["Second sentence, also present."]
        "#,
    );

    let max_len = 60;
    for seed in 0..200 {
        let composer = Composer::with_seed(Arc::clone(&bank), empty_chain(), max_len, seed);
        let text = composer.compose().await;
        assert!(!text.is_empty(), "seed {seed} produced empty text");
        assert!(
            text.chars().count() <= max_len,
            "seed {seed} produced {} chars: {text:?}",
            text.chars().count()
        );
    }
}

#[tokio::test]
async fn composed_topics_emit_one_fragment_per_part_in_order() {
    let bank = bank(
        r#"
        [[topics]]
        name = "two-liner"
        [[topics.parts]]
        name = "opening"
        fragments = ["alpha"]
        [[topics.parts]]
        name = "closing"
        fragments = ["beta"]
        "#,
    );

    let composer = Composer::with_seed(bank, empty_chain(), 280, 7);
    assert_eq!(composer.compose().await, "alpha beta");
}

#[tokio::test]
async fn headline_topics_substitute_the_fetched_headline() {
    let bank = bank(
        r#"
        [[topics]]
        name = "news"
        templates = ["Today: {headline}"]
        "#,
    );
    let chain = Arc::new(HeadlineChain::new(
        vec![Box::new(FixedSource("Bridge reopens after repairs")) as Box<dyn HeadlineSource>],
        "unused fallback",
    ));

    let composer = Composer::with_seed(bank, chain, 280, 1);
    assert_eq!(composer.compose().await, "Today: Bridge reopens after repairs");
}

#[tokio::test]
async fn overlong_composition_is_tail_truncated_with_ellipsis() {
    let bank = bank(
        r#"
        [[topics]]
        name = "news"
        templates = ["News: {headline}"]
        "#,
    );
    let chain = Arc::new(HeadlineChain::new(
        vec![Box::new(FixedSource("A very long headline text that overflows"))
            as Box<dyn HeadlineSource>],
        "unused fallback",
    ));

    let composer = Composer::with_seed(bank, chain, 20, 1);
    let text = composer.compose().await;
    assert_eq!(text, "News: A very long...");
    assert_eq!(text.chars().count(), 20);
}

#[tokio::test]
async fn hashtags_are_appended_only_when_the_whole_suffix_fits() {
    // 24 chars of base text + " #tiny" fits inside 30.
    let fits = bank(
        r#"
        [[topics]]
        name = "fits"
        hashtags = ["#tiny"]
        templates = ["Twenty-four chars here.."]
        "#,
    );
    let composer = Composer::with_seed(fits, empty_chain(), 30, 3);
    assert_eq!(composer.compose().await, "Twenty-four chars here.. #tiny");

    // Same base, but the only hashtag can never fit: omitted entirely,
    // never trimmed into a partial tag.
    let too_big = bank(
        r#"
        [[topics]]
        name = "nofit"
        hashtags = ["#averylonghashtagindeed"]
        templates = ["Twenty-four chars here.."]
        "#,
    );
    let composer = Composer::with_seed(too_big, empty_chain(), 30, 3);
    assert_eq!(composer.compose().await, "Twenty-four chars here..");
}

#[tokio::test]
async fn hashtag_count_respects_small_sets() {
    // One-element set: the draw is always exactly one tag.
    let bank = bank(
        r#"
        [[topics]]
        name = "solo"
        hashtags = ["#only"]
        templates = ["Base text."]
        "#,
    );
    for seed in 0..20 {
        let composer = Composer::with_seed(Arc::clone(&bank), empty_chain(), 280, seed);
        assert_eq!(composer.compose().await, "Base text. #only");
    }
}

#[test]
fn truncation_is_exact_at_the_boundary() {
    let exactly = "x".repeat(280);
    assert_eq!(truncate_with_ellipsis(&exactly, 280), exactly);

    let over = "x".repeat(281);
    let cut = truncate_with_ellipsis(&over, 280);
    assert_eq!(cut.chars().count(), 280);
    assert!(cut.ends_with("..."));
}
