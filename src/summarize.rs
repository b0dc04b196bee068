//! Summarization through a generative-language model.
//!
//! This module provides the summarizer used by the pipeline:
//! - [`GenerativeModel`]: core trait for "prompt in, text or refusal out"
//! - [`GeminiClient`]: the Gemini REST implementation of that trait
//! - [`Summarizer`]: precondition checks, truncation and prompt building on
//!   top of any [`GenerativeModel`]
//!
//! # Outcomes
//!
//! [`Summarizer::summarize`] never fails. Missing input or credentials are
//! reported as [`Summary::Skipped`] before any request is made; a refusal,
//! an empty answer or a transport/API error becomes [`Summary::Failed`].

use crate::config::{GeminiSettings, PROMPT_TEXT_PLACEHOLDER, SummarySettings};
use crate::models::{FailureReason, SkipReason, Summary};
use crate::utils::{truncate_chars, truncate_for_log};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Generous bound for a single generateContent call.
const GENERATE_TIMEOUT_SECS: u64 = 120;

/// What a model made of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Generated text, possibly empty.
    Text(String),
    /// The service refused to answer, with its stated reason.
    Blocked(String),
}

/// Trait for async text generation.
///
/// Implementors send a prompt to a model using the caller's API key. Errors
/// cover transport, authentication, quota and decoding failures.
pub trait GenerativeModel {
    /// Send `prompt` to the model.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Credential for this call.
    /// * `prompt` - Complete prompt text.
    ///
    /// # Returns
    ///
    /// Returns the model's text, or the reason it refused to answer.
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<Generation, Box<dyn Error>>;
}

/// Summarizes article text with a [`GenerativeModel`].
#[derive(Debug)]
pub struct Summarizer<M> {
    model: M,
    prompt_template: String,
    max_input_chars: usize,
}

impl<M: GenerativeModel> Summarizer<M> {
    /// Wrap `model` with the configured prompt template and input budget.
    pub fn new(model: M, settings: &SummarySettings) -> Self {
        Self {
            model,
            prompt_template: settings.prompt_template.clone(),
            max_input_chars: settings.max_input_chars,
        }
    }

    #[cfg(test)]
    pub(crate) fn model(&self) -> &M {
        &self.model
    }

    /// Embed `text` in the prompt template, hard-cut to the character budget.
    pub fn build_prompt(&self, text: &str) -> String {
        let (kept, truncated) = truncate_chars(text, self.max_input_chars);
        if truncated {
            warn!(
                chars = text.chars().count(),
                max_input_chars = self.max_input_chars,
                "Text exceeds the input budget; truncating for summarization"
            );
        }
        self.prompt_template.replace(PROMPT_TEXT_PLACEHOLDER, kept)
    }

    /// Summarize `text`, or explain why not.
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str, api_key: Option<&str>) -> Summary {
        if text.trim().is_empty() {
            warn!("Summarization skipped: no text content provided");
            return Summary::Skipped(SkipReason::NoContent);
        }
        let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
            warn!("Summarization skipped: API key is missing or empty");
            return Summary::Skipped(SkipReason::NoCredential);
        };

        let prompt = self.build_prompt(text);
        let t0 = Instant::now();
        let result = self.model.generate(api_key, &prompt).await;
        let elapsed_ms = t0.elapsed().as_millis();

        let summary = match result {
            Ok(Generation::Text(text)) if !text.trim().is_empty() => Summary::Generated(text),
            Ok(Generation::Text(_)) => Summary::Failed(FailureReason::Empty),
            Ok(Generation::Blocked(reason)) => Summary::Failed(FailureReason::Blocked(reason)),
            Err(e) => Summary::Failed(FailureReason::Api(e.to_string())),
        };

        match &summary {
            Summary::Generated(text) => info!(
                elapsed_ms,
                summary_chars = text.chars().count(),
                "Generated summary"
            ),
            Summary::Failed(FailureReason::Empty) => {
                warn!(elapsed_ms, "Model returned no content")
            }
            other => error!(elapsed_ms, outcome = %other, "Summarization failed"),
        }
        summary
    }
}

/// [`GenerativeModel`] backed by the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for the configured model. A leading `models/` in the
    /// model name is accepted and dropped.
    pub fn new(client: Client, settings: &GeminiSettings) -> Self {
        Self {
            client,
            api_base: settings.api_base.clone(),
            model: settings
                .model
                .trim_start_matches("models/")
                .to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base,
            urlencoding::encode(&self.model)
        )
    }
}

impl GenerativeModel for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<Generation, Box<dyn Error>> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .timeout(Duration::from_secs(GENERATE_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let payload = response.text().await?;

        if !status.is_success() {
            warn!(%status, body = %truncate_for_log(&payload, 300), "Gemini returned an error status");
            return Err(api_error_message(status, &payload).into());
        }

        let parsed: GenerateResponse = serde_json::from_str(&payload)?;
        Ok(parsed.into_generation())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn into_generation(self) -> Generation {
        let candidate = self.candidates.into_iter().next();
        let text: String = candidate
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if !text.is_empty() {
            return Generation::Text(text);
        }
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Generation::Blocked(reason);
        }
        match candidate {
            Some(Candidate {
                finish_reason: Some(reason),
                ..
            }) if reason != "STOP" => Generation::Blocked(reason),
            Some(_) => Generation::Text(text),
            None => Generation::Blocked("Unknown".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error_message(status: StatusCode, payload: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(payload) {
        Ok(body) => format!("HTTP {status}: {}", body.error.message),
        Err(_) => format!("HTTP {status}: {}", truncate_for_log(payload.trim(), 200)),
    }
}
