//! Slack notifications, with the tracing log as the fallback channel.

use std::time::Duration;

use mailcal_core::notify::{LogNotifier, Notifier};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const SLACK_API_URL: &str = "https://slack.com/api";
const SLACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts to a channel through `chat.postMessage`.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    timeout: Duration,
    base_url: String,
    bot_token: String,
    channel_id: String,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(bot_token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::with_base_url(SLACK_API_URL, bot_token, channel_id)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: SLACK_TIMEOUT,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            channel_id: channel_id.into(),
        }
    }

    /// Give up on a request that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn post(&self, text: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.bot_token)
            .json(&json!({ "channel": self.channel_id, "text": text }))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Slack returned {}", status);
        }

        // Slack reports most failures as 200 with ok=false
        let body: SlackResponse = response.json().await?;
        if !body.ok {
            anyhow::bail!(
                "Slack API error: {}",
                body.error.as_deref().unwrap_or("unknown")
            );
        }
        Ok(())
    }
}

impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) {
        match self.post(text).await {
            Ok(()) => debug!(channel = %self.channel_id, "Slack message sent"),
            Err(e) => warn!(error = %e, "Slack notification failed"),
        }
    }
}

/// The notifier selected by configuration.
#[derive(Debug, Clone)]
pub enum AnyNotifier {
    Slack(SlackNotifier),
    Log(LogNotifier),
}

impl AnyNotifier {
    pub fn from_credentials(slack: Option<(&str, &str)>) -> Self {
        match slack {
            Some((token, channel)) => AnyNotifier::Slack(SlackNotifier::new(token, channel)),
            None => AnyNotifier::Log(LogNotifier),
        }
    }
}

impl Notifier for AnyNotifier {
    async fn notify(&self, text: &str) {
        match self {
            AnyNotifier::Slack(slack) => slack.notify(text).await,
            AnyNotifier::Log(log) => log.notify(text).await,
        }
    }
}
