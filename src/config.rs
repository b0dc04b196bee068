//! Resolved runtime configuration.
//!
//! [`Config`] is built once at startup from the parsed [`Cli`] and an optional
//! YAML tunables file, then handed to each component. Nothing reads the
//! environment after this point.
//!
//! # Tunables file
//!
//! ```yaml
//! content_selectors:
//!   - article
//!   - "div.story"
//! page_timeout_secs: 15
//! prompt_template: "Summarize in three bullet points:\n\n{text}"
//! max_input_chars: 50000
//! notion_properties:
//!   title: Title
//!   summary: Summary
//!   url: Link
//! ```
//!
//! Keys that are left out keep their defaults.

use crate::cli::Cli;
use crate::utils::non_blank;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const DEFAULT_INTERVAL_MINUTES: u64 = 10;
pub const DEFAULT_MAX_ARTICLES: usize = 3;

/// Longest accepted schedule interval: one week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Selectors tried in order when looking for the article body.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".post-content",
    ".entry-content",
    ".td-post-content",
    r#"div[class*="article-content"]"#,
    r#"div[class*="story-body"]"#,
];

pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "Please summarize the following news article text:\n\n{text}";

/// Placeholder replaced by the article text in the prompt template.
pub const PROMPT_TEXT_PLACEHOLDER: &str = "{text}";

/// Optional overrides read from the YAML file given with `--config`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Tunables {
    /// Article container selectors, most specific first.
    pub content_selectors: Vec<String>,
    /// Page download timeout in seconds; `0` is raised to one second.
    pub page_timeout_secs: u64,
    /// Summarization prompt. `{text}` marks where the article goes.
    pub prompt_template: String,
    /// Character budget for the article text sent to the model.
    pub max_input_chars: usize,
    pub notion_properties: NotionProperties,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            content_selectors: DEFAULT_CONTENT_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            page_timeout_secs: 10,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            max_input_chars: 100_000,
            notion_properties: NotionProperties::default(),
        }
    }
}

impl Tunables {
    /// Parse tunables from YAML text. Unknown keys are rejected.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Read and parse the tunables file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid tunables
    /// YAML. A named but broken file stops startup.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let source = tokio::fs::read_to_string(path).await?;
        let tunables = Self::from_yaml(&source)?;
        info!(
            selectors = tunables.content_selectors.len(),
            max_input_chars = tunables.max_input_chars,
            "Loaded tunables"
        );
        Ok(tunables)
    }
}

/// Names of the Notion database columns the page is written to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NotionProperties {
    pub title: String,
    pub summary: String,
    pub url: String,
}

impl Default for NotionProperties {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            summary: "Summary".to_string(),
            url: "URL".to_string(),
        }
    }
}

/// Connection settings for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// API key; `None` disables summarization for every article.
    pub api_key: Option<String>,
    /// Model name, with or without the `models/` prefix.
    pub model: String,
    /// Scheme and host of the API, without a trailing slash.
    pub api_base: String,
}

/// Connection settings and database schema for Notion.
#[derive(Debug, Clone)]
pub struct NotionSettings {
    /// Integration token.
    pub api_key: Option<String>,
    /// Database that receives one page per summarized article.
    pub database_id: Option<String>,
    /// Scheme and host of the API, without a trailing slash.
    pub api_base: String,
    /// Property names of the target database.
    pub properties: NotionProperties,
}

/// Credential and destination for publishing, present only when both parts are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub api_key: String,
    pub database_id: String,
}

impl NotionSettings {
    /// Pair the token with the database id.
    ///
    /// # Returns
    ///
    /// `None` when either half is missing, in which case nothing is published.
    pub fn target(&self) -> Option<PublishTarget> {
        match (&self.api_key, &self.database_id) {
            (Some(api_key), Some(database_id)) => Some(PublishTarget {
                api_key: api_key.clone(),
                database_id: database_id.clone(),
            }),
            _ => None,
        }
    }
}

/// How article pages are downloaded and searched for their main text.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// CSS selectors tried in order; the first match is the article container.
    pub selectors: Vec<String>,
    /// Limit for downloading a single page.
    pub timeout: Duration,
}

/// Prompt construction for the summarizer.
#[derive(Debug, Clone)]
pub struct SummarySettings {
    /// Template containing the `{text}` placeholder.
    pub prompt_template: String,
    /// Article text beyond this many characters is cut before prompting.
    pub max_input_chars: usize,
}

/// Everything a pass needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct Config {
    /// RSS, Atom or JSON Feed URL polled on every pass.
    pub feed_url: String,
    /// Pause between the end of one pass and the start of the next.
    pub interval: Duration,
    /// Newest entries processed per pass; `0` processes none.
    pub max_articles: usize,
    pub gemini: GeminiSettings,
    pub notion: NotionSettings,
    pub extraction: ExtractionSettings,
    pub summary: SummarySettings,
}

impl Config {
    /// Combine parsed flags with the tunables file.
    ///
    /// Malformed numeric settings never abort startup; they fall back to their
    /// defaults with a warning.
    ///
    /// # Arguments
    ///
    /// * `cli` - Parsed flags and environment variables.
    /// * `tunables` - Values from the YAML file, or [`Tunables::default`].
    pub fn from_parts(cli: Cli, tunables: Tunables) -> Self {
        let interval_minutes = parse_or_default(
            "SCHEDULE_INTERVAL_MINUTES",
            &cli.schedule_interval_minutes,
            DEFAULT_INTERVAL_MINUTES,
            |m: &u64| (1..=MAX_INTERVAL_MINUTES).contains(m),
        );
        let max_articles = parse_or_default(
            "MAX_ARTICLES_TO_PROCESS",
            &cli.max_articles_to_process,
            DEFAULT_MAX_ARTICLES,
            |_| true,
        );

        let mut prompt_template = tunables.prompt_template;
        if !prompt_template.contains(PROMPT_TEXT_PLACEHOLDER) {
            warn!(
                placeholder = PROMPT_TEXT_PLACEHOLDER,
                "Prompt template has no text placeholder; appending the article text"
            );
            prompt_template.push_str("\n\n");
            prompt_template.push_str(PROMPT_TEXT_PLACEHOLDER);
        }

        Self {
            feed_url: cli.feed_url,
            interval: Duration::from_secs(interval_minutes * 60),
            max_articles,
            gemini: GeminiSettings {
                api_key: non_blank(cli.gemini_api_key),
                model: cli.gemini_model,
                api_base: cli.gemini_api_base.trim_end_matches('/').to_string(),
            },
            notion: NotionSettings {
                api_key: non_blank(cli.notion_api_key),
                database_id: non_blank(cli.notion_database_id),
                api_base: cli.notion_api_base.trim_end_matches('/').to_string(),
                properties: tunables.notion_properties,
            },
            extraction: ExtractionSettings {
                selectors: tunables.content_selectors,
                timeout: Duration::from_secs(tunables.page_timeout_secs.max(1)),
            },
            summary: SummarySettings {
                prompt_template,
                max_input_chars: tunables.max_input_chars,
            },
        }
    }

    /// Resolve the CLI, loading the tunables file when one is named.
    pub async fn load(cli: Cli) -> Result<Self, Box<dyn Error>> {
        let tunables = match cli.config.as_deref() {
            Some(path) => Tunables::load(path).await?,
            None => Tunables::default(),
        };
        Ok(Self::from_parts(cli, tunables))
    }
}

/// Parse a numeric setting, falling back to `default` when it is malformed or
/// rejected by `valid`.
fn parse_or_default<T>(name: &str, raw: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            warn!(setting = name, value = raw, %default, "Invalid value; using default");
            default
        }
    }
}
