//! Publishing summaries as pages in a Notion database.
//!
//! Each published article becomes one page created with `POST /v1/pages`:
//!
//! | Property (default name) | Notion type | Value |
//! |-------------------------|-------------|-------|
//! | `Name` | title | article title |
//! | `Summary` | rich_text | generated summary |
//! | `URL` | url | article link |
//!
//! Column names can be changed through the tunables file. Notion caps a
//! single rich-text object at 2000 characters, so long summaries are split
//! across several objects and titles are cut at that length.
//!
//! Once Notion accepts a page it owns it; this service keeps no copy and never
//! updates or deletes pages.

use crate::config::{NotionProperties, NotionSettings, PublishTarget};
use crate::models::PageRecord;
use crate::utils::{truncate_chars, truncate_for_log};
use itertools::Itertools;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// API version header sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Maximum characters in one rich-text object.
const RICH_TEXT_LIMIT: usize = 2000;

const PUBLISH_TIMEOUT_SECS: u64 = 30;

/// Why a page could not be created.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The request never got an HTTP answer: DNS, TLS, timeout or a reset.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Notion answered with a non-2xx status.
    #[error("Notion API error {status}: {message}")]
    Api {
        status: StatusCode,
        /// The service's `message` field, else the start of the raw body.
        message: String,
    },
}

/// Anything that can file a [`PageRecord`] in a database.
pub trait PagePublisher {
    /// Create one page for `record` in the database named by `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`] when the page was not created. Nothing is
    /// retried; the caller decides whether to move on.
    async fn publish(&self, target: &PublishTarget, record: &PageRecord) -> Result<(), PublishError>;
}

/// [`PagePublisher`] backed by the Notion REST API.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    api_base: String,
    properties: NotionProperties,
}

impl NotionClient {
    /// Create a client that writes pages using the configured property names.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client.
    /// * `settings` - API base URL and database property names.
    pub fn new(client: Client, settings: &NotionSettings) -> Self {
        Self {
            client,
            api_base: settings.api_base.clone(),
            properties: settings.properties.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    message: String,
}

impl PagePublisher for NotionClient {
    #[instrument(level = "info", skip_all, fields(title = %record.title, database_id = %target.database_id))]
    async fn publish(&self, target: &PublishTarget, record: &PageRecord) -> Result<(), PublishError> {
        let payload = page_payload(&target.database_id, &self.properties, record);

        let response = self
            .client
            .post(format!("{}/v1/pages", self.api_base))
            .bearer_auth(&target.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(Duration::from_secs(PUBLISH_TIMEOUT_SECS))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<NotionErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| truncate_for_log(body.trim(), 200));
            warn!(%status, %message, "Notion rejected the page");
            return Err(PublishError::Api { status, message });
        }

        match serde_json::from_str::<CreatedPage>(&body) {
            Ok(page) => info!(page_id = %page.id, page_url = ?page.url, "Created Notion page"),
            Err(_) => info!("Created Notion page"),
        }
        Ok(())
    }
}

/// Build the `POST /v1/pages` body for `record`.
pub fn page_payload(database_id: &str, properties: &NotionProperties, record: &PageRecord) -> Value {
    let (title, _) = truncate_chars(&record.title, RICH_TEXT_LIMIT);
    let summary = chunk_chars(&record.summary, RICH_TEXT_LIMIT)
        .into_iter()
        .map(|chunk| json!({ "type": "text", "text": { "content": chunk } }))
        .collect::<Vec<_>>();

    let mut props = serde_json::Map::new();
    props.insert(
        properties.title.clone(),
        json!({ "title": [{ "type": "text", "text": { "content": title } }] }),
    );
    props.insert(properties.summary.clone(), json!({ "rich_text": summary }));
    props.insert(
        properties.url.clone(),
        json!({ "url": record.source_url.as_str() }),
    );

    json!({
        "parent": { "database_id": database_id },
        "properties": props,
    })
}

/// Split `s` into pieces of at most `size` characters.
fn chunk_chars(s: &str, size: usize) -> Vec<String> {
    s.chars()
        .chunks(size)
        .into_iter()
        .map(|chunk| chunk.collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use url::Url;

    fn record(summary: &str) -> PageRecord {
        PageRecord {
            title: "Rust 2026 roadmap".into(),
            summary: summary.into(),
            source_url: Url::parse("https://news.example.com/rust").unwrap(),
        }
    }

    #[test]
    fn test_page_payload_shape() {
        let payload = page_payload("db-1", &NotionProperties::default(), &record("Short summary."));

        assert_eq!(payload["parent"]["database_id"], "db-1");
        assert_eq!(
            payload["properties"]["Name"]["title"][0]["text"]["content"],
            "Rust 2026 roadmap"
        );
        assert_eq!(
            payload["properties"]["Summary"]["rich_text"][0]["text"]["content"],
            "Short summary."
        );
        assert_eq!(
            payload["properties"]["URL"]["url"],
            "https://news.example.com/rust"
        );
    }

    #[test]
    fn test_long_summary_is_chunked() {
        let summary = "é".repeat(4500);
        let payload = page_payload("db-1", &NotionProperties::default(), &record(&summary));

        let chunks = payload["properties"]["Summary"]["rich_text"].as_array().unwrap();
        let lengths: Vec<_> = chunks
            .iter()
            .map(|c| c["text"]["content"].as_str().unwrap().chars().count())
            .collect();
        assert_eq!(lengths, vec![2000, 2000, 500]);
    }

    #[test]
    fn test_custom_property_names_and_long_title() {
        let properties = NotionProperties {
            title: "Headline".into(),
            summary: "TL;DR".into(),
            url: "Link".into(),
        };
        let mut rec = record("s");
        rec.title = "t".repeat(2500);
        let payload = page_payload("db-1", &properties, &rec);

        let title = payload["properties"]["Headline"]["title"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert_eq!(title.len(), 2000);
        assert!(payload["properties"]["TL;DR"]["rich_text"].is_array());
        assert!(payload["properties"]["Link"]["url"].is_string());
    }

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    }

    async fn create_page(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let database_id = body["parent"]["database_id"].as_str().unwrap_or_default().to_string();
        captured.requests.lock().unwrap().push((headers, body));
        if database_id == "missing-db" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "object": "error",
                    "status": 404,
                    "code": "object_not_found",
                    "message": "Could not find database with ID: missing-db."
                })),
            );
        }
        (
            StatusCode::OK,
            Json(json!({ "object": "page", "id": "page-1", "url": "https://www.notion.so/page-1" })),
        )
    }

    #[tokio::test]
    async fn test_publish_over_http() {
        let captured = Captured::default();
        let app = Router::new()
            .route("/v1/pages", post(create_page))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });

        let notion = NotionClient::new(
            Client::new(),
            &NotionSettings {
                api_key: None,
                database_id: None,
                api_base: format!("http://{address}"),
                properties: NotionProperties::default(),
            },
        );
        let target = PublishTarget {
            api_key: "secret_token".into(),
            database_id: "db-1".into(),
        };
        notion.publish(&target, &record("Summary")).await.unwrap();

        {
            let requests = captured.requests.lock().unwrap();
            assert_eq!(requests.len(), 1);
            let (headers, body) = &requests[0];
            assert_eq!(headers["authorization"], "Bearer secret_token");
            assert_eq!(headers["notion-version"], NOTION_VERSION);
            assert_eq!(body["parent"]["database_id"], "db-1");
        }

        let missing = PublishTarget {
            database_id: "missing-db".into(),
            ..target
        };
        match notion.publish(&missing, &record("Summary")).await {
            Err(PublishError::Api { status, message }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Could not find database with ID: missing-db.");
            }
            other => panic!("expected an API error, got {other:?}"),
        }

        server.abort();
    }
}
