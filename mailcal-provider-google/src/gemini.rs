//! Gemini `generateContent` client: titles, summaries and reply drafts.

use std::time::Duration;

use anyhow::{Context, Result};
use mailcal_core::llm::{TitleGenerator, title_from_answer};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::DEFAULT_REQUEST_TIMEOUT;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

const MAX_OUTPUT_TOKENS: u32 = 150;
const TOP_P: f32 = 0.9;
const MIN_REPLY_CHARS: usize = 10;

/// Byte sequences that show up when UTF-8 has been decoded as Latin-1.
const MOJIBAKE_MARKERS: &[&str] = &["ï¿½", "ð’¨·", "Â¶", "\u{FFFD}"];

pub const EMPTY_EMAIL_SUMMARY: &str = "Email content is empty.";
pub const FAILED_SUMMARY: &str = "An error occurred during summarization.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    timeout: Duration,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(GEMINI_API_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Give up on a request that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one prompt and return the trimmed answer text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.trim_start_matches("models/")
        );
        let request = GenerateRequest {
            contents: [Content {
                parts: [TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: self.temperature,
                top_p: TOP_P,
            },
        };

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to reach Gemini")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned {}: {}", status, body.trim());
        }

        let answer: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text: String = answer
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("Gemini returned no text");
        }
        Ok(text.to_string())
    }

    /// Bullet-point summary, or a fixed notice when there is nothing to
    /// summarize or the call fails.
    pub async fn summarize_email(&self, body: &str) -> String {
        if body.trim().is_empty() {
            return EMPTY_EMAIL_SUMMARY.to_string();
        }

        let prompt = format!(
            "Summarize this email in a concise, bullet-point style, preserving key facts:\n\n{}\n\nSummary:",
            body
        );
        match self.generate(&prompt).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Summarization failed");
                FAILED_SUMMARY.to_string()
            }
        }
    }

    /// Draft a reply. `None` when the body is empty, the call fails, or the
    /// answer is too short or garbled to send.
    pub async fn generate_reply(&self, body: &str) -> Option<String> {
        if body.trim().is_empty() {
            return None;
        }

        let prompt = format!(
            "You are an AI email assistant. Write a clear, polite reply to the following email. \
             Avoid repeating the original message.\n\nEmail:\n{}\n\nReply:",
            body
        );
        let reply = match self.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Reply generation failed");
                return None;
            }
        };

        if !is_usable_reply(&reply) {
            warn!(chars = reply.chars().count(), "Discarding unusable reply draft");
            return None;
        }
        Some(reply)
    }
}

impl TitleGenerator for GeminiClient {
    async fn generate_title(&self, body: &str) -> String {
        let prompt = format!(
            "From this email, generate a short and relevant calendar event title:\n\n{}\n\nTitle:",
            body
        );
        match self.generate(&prompt).await {
            Ok(answer) => title_from_answer(Some(&answer)),
            Err(e) => {
                error!(error = %e, "Title generation failed");
                title_from_answer(None)
            }
        }
    }
}

fn is_usable_reply(reply: &str) -> bool {
    reply.chars().count() >= MIN_REPLY_CHARS
        && !MOJIBAKE_MARKERS.iter().any(|marker| reply.contains(marker))
}
