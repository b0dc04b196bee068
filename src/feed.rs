//! Feed reader: turns the configured feed into an ordered list of [`Article`]s.
//!
//! Fetching goes through the shared `reqwest` client and parsing is delegated
//! to `feed-rs`, so RSS, Atom and JSON Feed documents are all accepted.
//!
//! Failures never leave this module. A network error, an HTTP error status or
//! a document the parser rejects is logged and yields an empty list, which the
//! driver treats as "nothing to do this pass".

use crate::models::Article;
use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Upper bound for downloading the feed document.
const FEED_TIMEOUT_SECS: u64 = 30;

/// Title used for entries that carry none.
pub const UNTITLED_ARTICLE: &str = "Untitled Article";

/// Anything that can list the articles currently in a feed.
pub trait FeedSource {
    /// Return the feed's articles in feed order; empty on any failure.
    async fn fetch_articles(&self, url: &str) -> Vec<Article>;
}

/// [`FeedSource`] backed by HTTP and `feed-rs`.
#[derive(Debug, Clone)]
pub struct FeedReader {
    client: Client,
}

impl FeedReader {
    /// Create a reader that uses the shared HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl FeedSource for FeedReader {
    #[instrument(level = "info", skip(self))]
    async fn fetch_articles(&self, url: &str) -> Vec<Article> {
        info!("Fetching feed");
        match self.fetch_bytes(url).await {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "Downloaded feed document");
                articles_from_bytes(&bytes, url)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status(), "Failed to fetch feed");
                Vec::new()
            }
        }
    }
}

/// Parse a feed document into articles, dropping entries without a usable link.
///
/// `feed_url` is used to resolve relative entry links.
pub fn articles_from_bytes(bytes: &[u8], feed_url: &str) -> Vec<Article> {
    let feed = match parser::parse(bytes) {
        Ok(feed) => feed,
        Err(e) => {
            error!(%feed_url, error = %e, "Feed document is malformed");
            return Vec::new();
        }
    };

    if feed.entries.is_empty() {
        warn!(%feed_url, "No entries found in the feed");
        return Vec::new();
    }
    info!(%feed_url, count = feed.entries.len(), "Found entries in feed");

    let base = Url::parse(feed_url).ok();
    feed.entries
        .iter()
        .filter_map(|entry| article_from_entry(entry, base.as_ref()))
        .collect()
}

fn article_from_entry(entry: &Entry, base: Option<&Url>) -> Option<Article> {
    let title = entry
        .title
        .as_ref()
        .map(|text| text.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_ARTICLE.to_string());

    let Some(href) = primary_link(&entry.links) else {
        warn!(%title, "Entry has no link; skipping");
        return None;
    };

    let link = Url::parse(href).or_else(|e| match base {
        Some(base) => base.join(href),
        None => Err(e),
    });
    match link {
        Ok(link) => Some(Article { title, link }),
        Err(e) => {
            warn!(%title, %href, error = %e, "Entry link is not a valid URL; skipping");
            None
        }
    }
}

/// The entry's alternate link, else its first non-empty link.
fn primary_link(links: &[Link]) -> Option<&str> {
    let usable = || links.iter().filter(|l| !l.href.trim().is_empty());
    usable()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| usable().next())
        .map(|l| l.href.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    const FEED_URL: &str = "https://news.example.com/feed.xml";

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <link>https://news.example.com/</link>
    <description>Test feed</description>
    <item>
      <title>First story</title>
      <link>https://news.example.com/first</link>
    </item>
    <item>
      <title>No link here</title>
      <description>Orphan entry</description>
    </item>
    <item>
      <link>https://news.example.com/untitled</link>
    </item>
    <item>
      <title>Relative story</title>
      <link>/relative</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_link_less_entries_are_dropped_in_order() {
        let articles = articles_from_bytes(RSS.as_bytes(), FEED_URL);

        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["First story", UNTITLED_ARTICLE, "Relative story"]);
        assert_eq!(articles[0].link.as_str(), "https://news.example.com/first");
        assert_eq!(articles[2].link.as_str(), "https://news.example.com/relative");
    }

    #[test]
    fn test_atom_feed() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom News</title>
  <id>urn:uuid:feed</id>
  <updated>2026-10-01T00:00:00Z</updated>
  <entry>
    <title>Atom story</title>
    <id>urn:uuid:1</id>
    <updated>2026-10-01T00:00:00Z</updated>
    <link rel="related" href="https://elsewhere.example.com/ref"/>
    <link rel="alternate" href="https://news.example.com/atom-story"/>
  </entry>
</feed>"#;
        let articles = articles_from_bytes(atom.as_bytes(), FEED_URL);

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Atom story");
        assert_eq!(articles[0].link.as_str(), "https://news.example.com/atom-story");
    }

    #[test]
    fn test_empty_feed_yields_nothing() {
        let empty = r#"<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;
        assert!(articles_from_bytes(empty.as_bytes(), FEED_URL).is_empty());
    }

    #[test]
    fn test_malformed_feed_yields_nothing() {
        assert!(articles_from_bytes(b"this is not a feed", FEED_URL).is_empty());
        assert!(articles_from_bytes(b"", FEED_URL).is_empty());
    }

    async fn spawn_feed_server() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route("/feed.xml", get(|| async { RSS }))
            .route(
                "/broken.xml",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "temporary failure") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        (format!("http://{address}"), handle)
    }

    #[tokio::test]
    async fn test_fetch_articles_over_http() {
        let (base, server) = spawn_feed_server().await;
        let reader = FeedReader::new(Client::new());

        let articles = reader.fetch_articles(&format!("{base}/feed.xml")).await;
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[2].link.as_str(), format!("{base}/relative"));

        let broken = reader.fetch_articles(&format!("{base}/broken.xml")).await;
        assert!(broken.is_empty());

        server.abort();
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_nothing() {
        let reader = FeedReader::new(Client::new());
        assert!(reader.fetch_articles("http://127.0.0.1:1/feed.xml").await.is_empty());
    }
}
