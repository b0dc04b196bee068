//! The driver: one sequential pass over the feed.
//!
//! For each of the first `max_articles` entries the pass runs
//! extract → summarize → publish, awaiting every step before starting the
//! next. A step that yields nothing stops work on that article only; the
//! pass always moves on to the next one.

use crate::config::{Config, PublishTarget};
use crate::extract::ContentSource;
use crate::feed::FeedSource;
use crate::models::{Article, PageRecord, PassReport, Summary};
use crate::publish::PagePublisher;
use crate::summarize::{GenerativeModel, Summarizer};
use crate::utils::truncate_for_log;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// How far a single article got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    NoContent,
    NotSummarized,
    NoPublishTarget,
    PublishFailed,
    Published,
}

/// One feed wired to its extractor, summarizer and publisher.
///
/// Generic over each stage so tests can swap in fakes. The pipeline keeps no
/// state between passes; calling [`Pipeline::run_pass`] twice processes the
/// same entries twice.
pub struct Pipeline<F, C, M, P> {
    feed_url: String,
    max_articles: usize,
    gemini_api_key: Option<String>,
    publish_target: Option<PublishTarget>,
    feed: F,
    content: C,
    summarizer: Summarizer<M>,
    publisher: P,
}

impl<F, C, M, P> Pipeline<F, C, M, P>
where
    F: FeedSource,
    C: ContentSource,
    M: GenerativeModel,
    P: PagePublisher,
{
    /// Assemble a pipeline from resolved configuration and its four stages.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the feed URL, the per-pass cap and the credentials.
    /// * `feed` - Lists the articles.
    /// * `content` - Fetches article text.
    /// * `summarizer` - Produces the [`Summary`].
    /// * `publisher` - Files the page.
    pub fn new(config: &Config, feed: F, content: C, summarizer: Summarizer<M>, publisher: P) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
            max_articles: config.max_articles,
            gemini_api_key: config.gemini.api_key.clone(),
            publish_target: config.notion.target(),
            feed,
            content,
            summarizer,
            publisher,
        }
    }

    /// Run one pass and report what happened.
    #[instrument(level = "info", skip_all, fields(feed_url = %self.feed_url))]
    pub async fn run_pass(&self) -> PassReport {
        let t0 = Instant::now();
        info!("Pass starting");
        let mut report = PassReport::default();

        let articles = self.feed.fetch_articles(&self.feed_url).await;
        report.fetched = articles.len();
        if articles.is_empty() {
            warn!("No articles found or the feed could not be parsed; pass finished");
            return report;
        }

        let total = articles.len().min(self.max_articles);
        info!(fetched = articles.len(), processing = total, "Fetched articles");

        for (i, article) in articles.iter().take(total).enumerate() {
            report.attempted += 1;
            let stage = self.process(i + 1, total, article).await;

            if stage != Stage::NoContent {
                report.extracted += 1;
            }
            if matches!(
                stage,
                Stage::NoPublishTarget | Stage::PublishFailed | Stage::Published
            ) {
                report.summarized += 1;
            }
            if stage == Stage::Published {
                report.published += 1;
            } else {
                report.skipped += 1;
            }
        }

        info!(
            fetched = report.fetched,
            attempted = report.attempted,
            extracted = report.extracted,
            summarized = report.summarized,
            published = report.published,
            skipped = report.skipped,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Pass finished"
        );
        report
    }

    #[instrument(level = "info", skip_all, fields(n = index, of = total, title = %article.title, link = %article.link))]
    async fn process(&self, index: usize, total: usize, article: &Article) -> Stage {
        info!("Processing article");

        let Some(text) = self.content.extract(&article.link).await else {
            error!("Could not fetch article text; skipping further processing for this article");
            return Stage::NoContent;
        };
        info!(chars = text.chars().count(), "Fetched article text");

        let summary = self
            .summarizer
            .summarize(&text, self.gemini_api_key.as_deref())
            .await;
        let summary = match summary {
            Summary::Generated(text) => text,
            other => {
                warn!(outcome = %other, "No usable summary; not publishing");
                return Stage::NotSummarized;
            }
        };
        info!(preview = %truncate_for_log(&summary, 100), "Summary ready");

        let Some(target) = &self.publish_target else {
            warn!("Notion API key or database id not configured; not publishing");
            return Stage::NoPublishTarget;
        };

        let record = PageRecord {
            title: article.title.clone(),
            summary,
            source_url: article.link.clone(),
        };
        match self.publisher.publish(target, &record).await {
            Ok(()) => Stage::Published,
            Err(e) => {
                error!(error = %e, "Failed to create Notion page");
                Stage::PublishFailed
            }
        }
    }
}
