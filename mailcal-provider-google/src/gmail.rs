//! Gmail v1 REST client: list unread, fetch, send, mark read.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, FixedOffset};
use mailcal_core::Message;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::DEFAULT_REQUEST_TIMEOUT;

pub const GMAIL_API_URL: &str = "https://gmail.googleapis.com";

/// Wrap width for HTML bodies rendered as text
const HTML_TEXT_WIDTH: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    payload: Option<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    timeout: Duration,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(GMAIL_API_URL, access_token)
    }

    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Give up on a request that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages", self.base_url)
    }

    /// Up to `max_results` unread messages, fully fetched.
    ///
    /// A message that fails to fetch is logged and skipped.
    pub async fn list_unread(&self, max_results: u32) -> Result<Vec<Message>> {
        let response = self
            .http
            .get(self.messages_url())
            .bearer_auth(&self.access_token)
            .query(&[("q", "is:unread"), ("maxResults", &max_results.to_string())])
            .timeout(self.timeout)
            .send()
            .await
            .context("Failed to list Gmail messages")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gmail list returned {}: {}", status, body.trim());
        }

        let list: MessageList = response
            .json()
            .await
            .context("Failed to parse Gmail message list")?;

        let mut messages = Vec::with_capacity(list.messages.len());
        for stub in list.messages {
            match self.get(&stub.id).await {
                Ok(message) => messages.push(message),
                Err(e) => warn!(id = %stub.id, error = %e, "Skipping message"),
            }
        }
        Ok(messages)
    }

    /// Fetch one message with headers and a plain-text body.
    pub async fn get(&self, id: &str) -> Result<Message> {
        let response = self
            .http
            .get(format!("{}/{}", self.messages_url(), id))
            .bearer_auth(&self.access_token)
            .query(&[("format", "full")])
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to fetch message {}", id))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gmail get {} returned {}: {}", id, status, body.trim());
        }

        let full: FullMessage = response
            .json()
            .await
            .with_context(|| format!("Failed to parse message {}", id))?;

        Ok(into_message(full))
    }

    /// Remove the UNREAD label.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/{}/modify", self.messages_url(), id))
            .bearer_auth(&self.access_token)
            .json(&json!({ "removeLabelIds": ["UNREAD"] }))
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to mark message {} as read", id))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gmail modify {} returned {}: {}", id, status, body.trim());
        }

        debug!(id, "Marked as read");
        Ok(())
    }

    /// Send a plain-text message. Returns the new message id.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String> {
        let raw = encode_raw_message(to, subject, body);

        let response = self
            .http
            .post(format!("{}/send", self.messages_url()))
            .bearer_auth(&self.access_token)
            .json(&json!({ "raw": raw }))
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to send message to {}", to))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gmail send returned {}: {}", status, body.trim());
        }

        let sent: SentMessage = response
            .json()
            .await
            .context("Failed to parse send response")?;
        info!(to, id = %sent.id, "Sent message");
        Ok(sent.id)
    }
}

fn into_message(full: FullMessage) -> Message {
    let payload = full.payload.unwrap_or_default();

    let header = |name: &str| -> String {
        payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
            .unwrap_or_default()
    };

    Message {
        id: full.id,
        thread_id: full.thread_id,
        sender: header("From"),
        recipient: header("To"),
        subject: header("Subject"),
        received_at: parse_date_header(&header("Date")),
        body: body_text(&payload).unwrap_or_default(),
    }
}

/// Parse an RFC 2822 `Date` header, tolerating a trailing zone comment
/// such as "(UTC)" or "(PST)".
fn parse_date_header(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let without_comment = match value.rfind('(') {
        Some(i) if value.ends_with(')') => value[..i].trim_end(),
        _ => value,
    };

    DateTime::parse_from_rfc2822(without_comment).ok()
}

/// Plain text of a message: the first `text/plain` part, else the first
/// `text/html` part rendered as text, else a single-part body.
fn body_text(payload: &Part) -> Option<String> {
    if payload.parts.is_empty() {
        let data = decode_part(payload)?;
        return Some(if payload.mime_type == "text/html" {
            html_to_text(&data)
        } else {
            data
        });
    }

    if let Some(text) = find_part(payload, "text/plain").and_then(decode_part) {
        return Some(text);
    }
    find_part(payload, "text/html")
        .and_then(decode_part)
        .map(|html| html_to_text(&html))
}

fn find_part<'a>(part: &'a Part, mime_type: &str) -> Option<&'a Part> {
    if part.mime_type == mime_type && part.body.as_ref().is_some_and(|b| b.data.is_some()) {
        return Some(part);
    }
    part.parts.iter().find_map(|child| find_part(child, mime_type))
}

fn decode_part(part: &Part) -> Option<String> {
    let data = part.body.as_ref()?.data.as_deref()?;
    let bytes = URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Could not render HTML body");
            String::new()
        }
    }
}

/// RFC 2822 message encoded the way the Gmail `send` endpoint expects.
fn encode_raw_message(to: &str, subject: &str, body: &str) -> String {
    let subject = if subject.is_ascii() {
        subject.to_string()
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(subject))
    };

    let mime = format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        to, subject, body
    );
    URL_SAFE.encode(mime)
}
