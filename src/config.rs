use anyhow::{Context, Result};
use mailcal_core::{ClassifierSettings, MessageStore, SchedulerConfig, SchedulingSettings};
use mailcal_provider_google::gemini::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MAX_EMAILS: u32 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduling: SchedulingSettings,
    pub classifier: ClassifierSettings,
    pub mail: MailConfig,
    pub google: GoogleConfig,
    pub gemini: GeminiConfig,
    pub slack: SlackConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Unread messages fetched per run
    pub max_emails: u32,
    /// Message store location; defaults to the platform data directory
    pub store_path: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            max_emails: DEFAULT_MAX_EMAILS,
            store_path: None,
        }
    }
}

/// OAuth access token with Gmail and Calendar scopes
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Slack notifications. Off unless `enabled = true`, in which case both
/// the bot token and channel are required.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
}

impl Config {
    /// Fill unset secrets from the environment.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("GOOGLE_ACCESS_TOKEN") {
            self.google.access_token = Some(token);
        }
        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(token) = non_empty("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Some(channel) = non_empty("SLACK_CHANNEL_ID") {
            self.slack.channel_id = Some(channel);
        }
    }

    pub fn google_token(&self) -> Result<&str> {
        required(
            self.google.access_token.as_deref(),
            "Google access token",
            "[google] access_token",
            "GOOGLE_ACCESS_TOKEN",
        )
    }

    pub fn gemini_api_key(&self) -> Result<&str> {
        required(
            self.gemini.api_key.as_deref(),
            "Gemini API key",
            "[gemini] api_key",
            "GEMINI_API_KEY",
        )
    }

    /// Bot token and channel, or `None` when Slack is disabled.
    pub fn slack_credentials(&self) -> Result<Option<(&str, &str)>> {
        if !self.slack.enabled {
            return Ok(None);
        }
        let token = required(
            self.slack.bot_token.as_deref(),
            "Slack bot token",
            "[slack] bot_token",
            "SLACK_BOT_TOKEN",
        )?;
        let channel = required(
            self.slack.channel_id.as_deref(),
            "Slack channel",
            "[slack] channel_id",
            "SLACK_CHANNEL_ID",
        )?;
        Ok(Some((token, channel)))
    }

    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        SchedulerConfig::try_from(&self.scheduling).context("Invalid [scheduling] settings")
    }

    /// Per-request limit for every HTTP client, from `[scheduling] provider_timeout`.
    pub fn provider_timeout(&self) -> Result<Duration> {
        Ok(self.scheduler_config()?.retry.timeout)
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        Ok(MessageStore::resolve_path(self.mail.store_path.as_deref())?)
    }
}

fn required<'a>(value: Option<&'a str>, what: &str, key: &str, env: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => anyhow::bail!(
            "No {} configured.\n\n\
            Set {} in {} or export {}.",
            what,
            key,
            config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.toml".to_string()),
            env
        ),
    }
}

/// Get the config directory path (~/.config/mailcal)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("mailcal");
    Ok(config_dir)
}

/// Get the config file path (~/.config/mailcal/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from `path`, or ~/.config/mailcal/config.toml.
///
/// A missing default file means all defaults; a missing explicit file is an
/// error. Secrets from the environment are applied on top.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => {
            let path = config_path()?;
            if path.exists() {
                read_config(&path)?
            } else {
                Config::default()
            }
        }
    };

    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use mailcal_core::TimezonePolicy;
    use std::collections::HashMap;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("");
        assert_eq!(config.mail.max_emails, 10);
        assert_eq!(config.classifier.extra_keywords, vec!["meet"]);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert!(!config.slack.enabled);

        let scheduler = config.scheduler_config().unwrap();
        assert_eq!(scheduler.timezone, Tz::Asia__Kolkata);
        assert_eq!(scheduler.meeting_duration, chrono::Duration::hours(1));
    }

    #[test]
    fn full_file() {
        let config = parse(
            r#"
            [scheduling]
            timezone = "America/New_York"
            timezone_policy = "convert"
            meeting_duration = "45m"
            calendar_id = "team@group.calendar.google.com"

            [classifier]
            extra_keywords = ["meet", "catch up"]

            [mail]
            max_emails = 25
            store_path = "/var/lib/mailcal/messages.json"

            [google]
            access_token = "ya29.token"

            [gemini]
            api_key = "gem-key"
            temperature = 0.4

            [slack]
            enabled = true
            bot_token = "xoxb-1"
            channel_id = "C123"
            "#,
        );

        let scheduler = config.scheduler_config().unwrap();
        assert_eq!(scheduler.timezone, Tz::America__New_York);
        assert_eq!(scheduler.timezone_policy, TimezonePolicy::Convert);
        assert_eq!(scheduler.meeting_duration, chrono::Duration::minutes(45));
        assert_eq!(scheduler.calendar_id, "team@group.calendar.google.com");
        assert_eq!(config.classifier.extra_keywords, vec!["meet", "catch up"]);
        assert_eq!(config.mail.max_emails, 25);
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/var/lib/mailcal/messages.json")
        );
        assert_eq!(config.google_token().unwrap(), "ya29.token");
        assert_eq!(config.gemini_api_key().unwrap(), "gem-key");
        assert_eq!(config.slack_credentials().unwrap(), Some(("xoxb-1", "C123")));
    }

    #[test]
    fn environment_fills_secrets() {
        let env: HashMap<&str, &str> = [
            ("GOOGLE_ACCESS_TOKEN", "env-token"),
            ("GEMINI_API_KEY", "env-key"),
            ("SLACK_BOT_TOKEN", ""),
        ]
        .into_iter()
        .collect();

        let mut config = parse("[slack]\nbot_token = \"from-file\"\n");
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.google_token().unwrap(), "env-token");
        assert_eq!(config.gemini_api_key().unwrap(), "env-key");
        // Empty variables do not clobber the file
        assert_eq!(config.slack.bot_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_credentials_are_errors() {
        let config = parse("[slack]\nenabled = true\nbot_token = \"xoxb\"\n");
        let err = config.google_token().unwrap_err().to_string();
        assert!(err.contains("GOOGLE_ACCESS_TOKEN"));
        assert!(config.gemini_api_key().is_err());
        assert!(config.slack_credentials().is_err());
        assert_eq!(parse("").slack_credentials().unwrap(), None);
    }

    #[test]
    fn invalid_scheduling_is_reported() {
        let config = parse("[scheduling]\ntimezone = \"Nowhere/Special\"\n");
        assert!(config.scheduler_config().is_err());
    }

    #[test]
    fn provider_timeout_applies_to_clients() {
        assert_eq!(parse("").provider_timeout().unwrap(), Duration::from_secs(30));
        let config = parse("[scheduling]\nprovider_timeout = \"5s\"\n");
        assert_eq!(config.provider_timeout().unwrap(), Duration::from_secs(5));
        assert!(parse("[scheduling]\nprovider_timeout = \"soon\"\n").provider_timeout().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[mail]\nmax_emails = 3\n").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().mail.max_emails, 3);
    }
}
