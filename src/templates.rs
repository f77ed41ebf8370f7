//! Template bank: the static Topic -> TemplateGroup catalog.
//!
//! Loaded once at startup from TOML (embedded default, or a file given via
//! `TEMPLATES_PATH`) and immutable afterwards. The shape of each topic is
//! resolved here, at load time, so the composer never has to guess.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Marker substituted with a live headline in headline-shaped templates.
pub const HEADLINE_PLACEHOLDER: &str = "{headline}";

const EMBEDDED_CATALOG: &str = include_str!("../config/templates.toml");

/// One named slot of a composed topic, e.g. `opening` or `closing`.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub fragments: Vec<String>,
}

/// How a topic's text is produced. Fixed when the catalog is loaded.
#[derive(Debug, Clone)]
pub enum TemplateGroup {
    /// Complete texts; one is picked as-is.
    Standalone(Vec<String>),
    /// Texts with exactly one `{headline}` placeholder each; a fetched
    /// headline is substituted into the chosen one.
    Headline(Vec<String>),
    /// Ordered parts; one fragment per part, joined with single spaces.
    Composed(Vec<Part>),
}

#[derive(Debug, Clone)]
pub struct Topic {
    pub name: String,
    pub group: TemplateGroup,
    pub hashtags: Vec<String>,
}

/// Immutable, validated topic catalog.
#[derive(Debug)]
pub struct TemplateBank {
    topics: Vec<Topic>,
}

// --- raw TOML shapes ---

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    topics: Vec<TopicRaw>,
}

#[derive(Debug, Deserialize)]
struct TopicRaw {
    name: String,
    #[serde(default)]
    templates: Vec<String>,
    #[serde(default)]
    parts: Vec<PartRaw>,
    #[serde(default)]
    hashtags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PartRaw {
    name: String,
    #[serde(default)]
    fragments: Vec<String>,
}

impl TemplateBank {
    /// Load from `path` when given, otherwise fall back to the embedded catalog.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = fs::read_to_string(p)
                    .with_context(|| format!("reading template catalog from {}", p.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("parsing template catalog {}", p.display()))
            }
            None => Self::embedded(),
        }
    }

    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_CATALOG).context("parsing embedded template catalog")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: CatalogFile = toml::from_str(s).context("template catalog is not valid TOML")?;
        if raw.topics.is_empty() {
            bail!("template catalog defines no topics");
        }

        let mut topics = Vec::with_capacity(raw.topics.len());
        for t in raw.topics {
            topics.push(convert_topic(t)?);
        }
        Ok(Self { topics })
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// True when at least one topic needs a live headline.
    pub fn wants_headlines(&self) -> bool {
        self.topics
            .iter()
            .any(|t| matches!(t.group, TemplateGroup::Headline(_)))
    }
}

fn convert_topic(raw: TopicRaw) -> Result<Topic> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        bail!("topic with empty name");
    }

    let has_parts = !raw.parts.is_empty();
    let has_templates = !raw.templates.is_empty();
    if has_parts && has_templates {
        bail!("topic '{name}' defines both parts and templates");
    }

    let group = if has_parts {
        let mut parts = Vec::with_capacity(raw.parts.len());
        for p in raw.parts {
            let fragments = clean_texts(p.fragments);
            if fragments.is_empty() {
                bail!("topic '{name}' part '{}' has no usable fragments", p.name);
            }
            parts.push(Part {
                name: p.name,
                fragments,
            });
        }
        TemplateGroup::Composed(parts)
    } else if has_templates {
        let templates = clean_texts(raw.templates);
        if templates.is_empty() {
            bail!("topic '{name}' has no usable templates");
        }
        let with_placeholder = templates
            .iter()
            .filter(|t| t.contains(HEADLINE_PLACEHOLDER))
            .count();
        if with_placeholder == 0 {
            TemplateGroup::Standalone(templates)
        } else if with_placeholder == templates.len() {
            for t in &templates {
                if t.matches(HEADLINE_PLACEHOLDER).count() != 1 {
                    bail!("topic '{name}' template '{t}' must contain {HEADLINE_PLACEHOLDER} exactly once");
                }
            }
            TemplateGroup::Headline(templates)
        } else {
            bail!("topic '{name}' mixes headline and standalone templates");
        }
    } else {
        bail!("topic '{name}' defines neither parts nor templates");
    };

    Ok(Topic {
        name,
        group,
        hashtags: clean_texts(raw.hashtags),
    })
}

fn clean_texts(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
