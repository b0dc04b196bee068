//! Command-line interface definitions for News Digest.
//!
//! Every option can come from a flag or an environment variable, and a `.env`
//! file in the working directory is loaded before parsing. Numeric options are
//! taken as raw strings here; [`crate::config::Config`] validates them so a
//! bad value falls back to its default instead of aborting startup.

use clap::Parser;

pub const DEFAULT_FEED_URL: &str = "https://news.buzzing.cc/feed.xml";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com";

/// Command-line arguments for the News Digest service.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment / .env
/// news_digest
///
/// # One pass against a different feed, then exit
/// news_digest --feed-url https://example.com/rss.xml --once
///
/// # Tune selectors and prompt from a YAML file
/// news_digest -c ./digest.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Feed to poll (RSS, Atom or JSON Feed)
    #[arg(long, env = "RSS_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Gemini API key; summarization is skipped without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for summaries
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_GEMINI_API_BASE, hide = true)]
    pub gemini_api_base: String,

    /// Notion integration token; publishing is skipped without it
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true)]
    pub notion_api_key: Option<String>,

    /// Notion database receiving the summary pages
    #[arg(long, env = "NOTION_DATABASE_ID")]
    pub notion_database_id: Option<String>,

    /// Base URL of the Notion REST API
    #[arg(long, env = "NOTION_API_BASE", default_value = DEFAULT_NOTION_API_BASE, hide = true)]
    pub notion_api_base: String,

    /// Minutes between passes (invalid values fall back to 10)
    #[arg(long, env = "SCHEDULE_INTERVAL_MINUTES", default_value = "10")]
    pub schedule_interval_minutes: String,

    /// Articles handled per pass (invalid values fall back to 3)
    #[arg(long, env = "MAX_ARTICLES_TO_PROCESS", default_value = "3")]
    pub max_articles_to_process: String,

    /// Log file, appended to on every run
    #[arg(long, env = "LOG_FILE", default_value = "app.log")]
    pub log_file: String,

    /// Optional path to a YAML file with extraction and prompt tunables
    #[arg(short, long, env = "NEWS_DIGEST_CONFIG")]
    pub config: Option<String>,

    /// Run a single pass and exit instead of scheduling
    #[arg(long)]
    pub once: bool,
}
