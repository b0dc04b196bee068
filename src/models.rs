//! Data models passed between the pipeline stages.
//!
//! This module defines the values that flow through a single pass:
//! - [`Article`]: a feed entry that carries a usable link
//! - [`Summary`]: the tagged outcome of summarization
//! - [`PageRecord`]: what gets filed in the Notion database
//! - [`PassReport`]: per-pass counters for the log
//!
//! Nothing here outlives a pass. There is no cache and no record of what was
//! published before.

use std::fmt;
use url::Url;

/// A feed entry that survived filtering.
///
/// Identity is the link alone; the same link seen on a later pass is processed
/// again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Entry title, or `"Untitled Article"` when the feed omitted it.
    pub title: String,
    /// Absolute link to the article page.
    pub link: Url,
}

/// Why summarization was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The extracted text was empty.
    NoContent,
    /// No generative API key is configured.
    NoCredential,
}

/// Why an attempted summarization produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The service refused to generate, with the reason it reported.
    Blocked(String),
    /// The service answered but returned no text.
    Empty,
    /// Transport, auth, quota or decoding failure.
    Api(String),
}

/// Outcome of summarizing one article.
///
/// Only [`Summary::Generated`] is publishable. The driver branches on the
/// variant; the [`fmt::Display`] text is for humans reading the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    Generated(String),
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Generated(text) => f.write_str(text),
            Summary::Skipped(SkipReason::NoContent) => {
                f.write_str("Summarization skipped (No text content provided).")
            }
            Summary::Skipped(SkipReason::NoCredential) => {
                f.write_str("Summarization skipped (API key not configured).")
            }
            Summary::Failed(FailureReason::Blocked(reason)) => {
                write!(f, "Gemini API: Content generation blocked. Reason: {reason}")
            }
            Summary::Failed(FailureReason::Empty) => {
                f.write_str("No content generated by the model.")
            }
            Summary::Failed(FailureReason::Api(error)) => {
                write!(f, "Gemini API call failed: {error}")
            }
        }
    }
}

/// A page about to be created in the Notion database.
///
/// Once submitted the page belongs to Notion; nothing is kept locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub title: String,
    pub summary: String,
    pub source_url: Url,
}

/// Counters for one pass over the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Articles returned by the feed, before the per-run cap.
    pub fetched: usize,
    /// Articles the pass actually worked on.
    pub attempted: usize,
    /// Articles whose page text was extracted.
    pub extracted: usize,
    /// Articles with a publishable summary.
    pub summarized: usize,
    /// Pages accepted by Notion.
    pub published: usize,
    /// Articles that stopped short of publishing for any reason.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display_messages() {
        assert_eq!(
            Summary::Skipped(SkipReason::NoCredential).to_string(),
            "Summarization skipped (API key not configured)."
        );
        assert_eq!(
            Summary::Failed(FailureReason::Blocked("SAFETY".into())).to_string(),
            "Gemini API: Content generation blocked. Reason: SAFETY"
        );
        assert_eq!(
            Summary::Failed(FailureReason::Api("HTTP 403".into())).to_string(),
            "Gemini API call failed: HTTP 403"
        );
        assert_eq!(Summary::Generated("verbatim".into()).to_string(), "verbatim");
    }
}
