//! # News Digest
//!
//! A small unattended service that polls one news feed, scrapes the full text
//! of the newest articles, summarizes each with Gemini and files the summary
//! as a page in a Notion database.
//!
//! ## Usage
//!
//! ```sh
//! GEMINI_API_KEY=... NOTION_API_KEY=... NOTION_DATABASE_ID=... news_digest
//! ```
//!
//! ## Architecture
//!
//! Each pass is strictly sequential:
//! 1. **Feed**: list the entries of the configured feed
//! 2. **Extraction**: download each article page and pull out its text
//! 3. **Summarization**: ask the model for a summary
//! 4. **Publishing**: create a Notion page with title, summary and link
//!
//! A pass runs at startup and then every `SCHEDULE_INTERVAL_MINUTES`, until
//! Ctrl-C. Missing credentials degrade the pass instead of stopping it.

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use tracing::{error, info};

mod cli;
mod config;
mod extract;
mod feed;
mod logging;
mod models;
mod pipeline;
mod publish;
mod scheduler;
mod summarize;
mod utils;

use cli::Cli;
use config::Config;
use extract::ArticleExtractor;
use feed::FeedReader;
use pipeline::Pipeline;
use publish::NotionClient;
use summarize::{GeminiClient, Summarizer};

const USER_AGENT: &str = concat!("news_digest/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let dotenv = dotenvy::dotenv().ok();
    let args = Cli::parse();
    logging::init(&args.log_file)?;

    info!(version = env!("CARGO_PKG_VERSION"), "news_digest starting up");
    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let once = args.once;
    let config = Config::load(args).await?;
    info!(
        feed_url = %config.feed_url,
        interval_minutes = config.interval.as_secs() / 60,
        max_articles = config.max_articles,
        summarization = config.gemini.api_key.is_some(),
        publishing = config.notion.target().is_some(),
        "Configuration resolved"
    );

    let client = Client::builder().user_agent(USER_AGENT).build()?;
    let pipeline = Pipeline::new(
        &config,
        FeedReader::new(client.clone()),
        ArticleExtractor::new(client.clone(), &config.extraction),
        Summarizer::new(GeminiClient::new(client.clone(), &config.gemini), &config.summary),
        NotionClient::new(client, &config.notion),
    );

    if once {
        pipeline.run_pass().await;
        info!("Single pass complete");
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    };

    info!(
        interval_minutes = config.interval.as_secs() / 60,
        "Scheduler started; press Ctrl-C to exit"
    );
    let passes = scheduler::run_every(config.interval, shutdown, || pipeline.run_pass()).await;
    info!(passes, "news_digest stopped");

    Ok(())
}
