//! Content extractor: fetches an article page and pulls out its readable text.
//!
//! Pages have no common structure, so the extractor works through an ordered
//! list of CSS selectors and takes the first element any of them matches. No
//! scoring, no merging. When nothing matches it falls back to `<body>`.
//!
//! Within the chosen container, `<p>` elements are preferred: their text is
//! whitespace-normalised and joined with newlines in document order. A
//! container without paragraphs degrades to all of its visible text nodes.
//!
//! # Failure taxonomy
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`ExtractError::Timeout`] | page did not answer within the timeout |
//! | [`ExtractError::Status`] | non-2xx response |
//! | [`ExtractError::Request`] | any other transport error |
//! | [`ExtractError::NoBody`] | no container and no `<body>` |
//! | [`ExtractError::Empty`] | extraction produced only whitespace |
//!
//! All of them are logged and surface as `None` from [`ContentSource::extract`].
//!
//! # Character encoding
//!
//! Pages are read as raw bytes. The charset comes from the `Content-Type`
//! header, else from a `<meta>` declaration near the top of the document, else
//! a byte order mark, else UTF-8. Undecodable bytes become U+FFFD.

use crate::config::ExtractionSettings;
use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HEADER_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";\s]+)"#).unwrap());
static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_.:\-]+)"#).unwrap()
});

/// How far into the document a `<meta>` charset declaration is looked for.
const META_SNIFF_BYTES: usize = 1024;

/// Elements whose text is never reader-visible.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Why a page yielded no text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP error {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("no article container and no <body> element")]
    NoBody,
    #[error("extracted text is empty")]
    Empty,
}

/// Anything that can turn an article link into its readable text.
pub trait ContentSource {
    /// Return the page's main text, or `None` after logging why there is none.
    async fn extract(&self, url: &Url) -> Option<String>;
}

/// [`ContentSource`] that downloads the page and applies the selector heuristic.
#[derive(Debug)]
pub struct ArticleExtractor {
    client: Client,
    selectors: Vec<(String, Selector)>,
    timeout: Duration,
}

impl ArticleExtractor {
    /// Compile the configured selectors; invalid ones are logged and dropped.
    pub fn new(client: Client, settings: &ExtractionSettings) -> Self {
        let selectors = settings
            .selectors
            .iter()
            .filter_map(|raw| match Selector::parse(raw) {
                Ok(selector) => Some((raw.clone(), selector)),
                Err(e) => {
                    warn!(selector = %raw, error = %e, "Ignoring invalid content selector");
                    None
                }
            })
            .collect();

        Self {
            client,
            selectors,
            timeout: settings.timeout,
        }
    }

    /// Download the page body, mapping transport failures onto [`ExtractError`].
    pub async fn fetch_html(&self, url: &Url) -> Result<String, ExtractError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                ExtractError::Timeout(self.timeout)
            } else if let Some(status) = e.status() {
                ExtractError::Status(status)
            } else {
                ExtractError::Request(e)
            }
        };

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(classify)?;
        Ok(decode_html(&bytes, content_type.as_deref()))
    }

    /// Apply the container heuristic to an HTML document.
    pub fn main_text(&self, html: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(html);

        let container = match self.find_container(&document) {
            Some(container) => container,
            None => {
                warn!("No article container matched; falling back to <body>");
                document.select(&BODY).next().ok_or(ExtractError::NoBody)?
            }
        };

        let text = if container.select(&PARAGRAPH).next().is_some() {
            container
                .select(&PARAGRAPH)
                .map(|p| normalize(&visible_text(p).collect::<String>()))
                .filter(|t| !t.is_empty())
                .join("\n")
        } else {
            warn!("Container has no <p> elements; using all of its text");
            visible_text(container)
                .map(normalize)
                .filter(|t| !t.is_empty())
                .join("\n")
        };

        let text = text.trim();
        if text.is_empty() {
            Err(ExtractError::Empty)
        } else {
            Ok(text.to_string())
        }
    }

    fn find_container<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        self.selectors.iter().find_map(|(raw, selector)| {
            let element = document.select(selector).next()?;
            debug!(selector = %raw, "Matched article container");
            Some(element)
        })
    }
}

impl ContentSource for ArticleExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn extract(&self, url: &Url) -> Option<String> {
        let result = match self.fetch_html(url).await {
            Ok(html) => self.main_text(&html),
            Err(e) => Err(e),
        };

        match result {
            Ok(text) => {
                info!(chars = text.chars().count(), "Extracted article text");
                Some(text)
            }
            Err(ExtractError::Empty) => {
                warn!("Extracted text content is empty");
                None
            }
            Err(e) => {
                error!(error = %e, "Could not extract article text");
                None
            }
        }
    }
}

/// Text nodes under `element`, skipping script-like elements.
fn visible_text(element: ElementRef<'_>) -> impl Iterator<Item = &str> {
    element.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .is_some_and(|parent| HIDDEN_TAGS.contains(&parent.name()));
        if hidden { None } else { Some(&**text) }
    })
}

/// Decode a page body using its declared charset.
///
/// # Arguments
///
/// * `bytes` - Raw response body.
/// * `content_type` - The `Content-Type` header value, if any.
///
/// # Returns
///
/// The document as UTF-8. Unknown charset labels are treated as UTF-8.
fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let from_header = content_type
        .and_then(|value| HEADER_CHARSET.captures(value))
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()));
    let encoding = from_header.or_else(|| sniff_meta_charset(bytes));

    let (text, used, had_errors) = encoding.unwrap_or(UTF_8).decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "Page contained undecodable bytes");
    }
    text.into_owned()
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_BYTES)]);
    let caps = META_CHARSET.captures(&head)?;
    Encoding::for_label(caps[1].as_bytes())
}

fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
