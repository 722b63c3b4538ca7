//! Scheduling configuration.
//!
//! `SchedulingSettings` is the raw `[scheduling]` table from config.toml.
//! `SchedulerConfig` is the validated form handed to the scheduler and
//! orchestrator; it is read-only for the duration of a run.

use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::classify::DEFAULT_EXTRA_KEYWORDS;
use crate::error::{MailcalError, MailcalResult};

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_MEETING_DURATION: &str = "1h";
const DEFAULT_PROVIDER_TIMEOUT: &str = "30s";
const DEFAULT_RETRY_BACKOFF: &str = "500ms";
const DEFAULT_RETRIES: u32 = 1;
/// Longest accepted meeting
const MAX_MEETING_DURATION_HOURS: i64 = 24;

/// How an instant that already carries a zone is placed in the target zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezonePolicy {
    /// Keep the wall-clock reading and re-tag it with the target zone.
    /// "10:00 UTC" becomes 10:00 in the target zone.
    #[default]
    Relabel,
    /// Convert to the target zone. "10:00 UTC" becomes 15:30 in Asia/Kolkata.
    Convert,
}

/// Retry behaviour for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt, only for transient errors
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each retry after that
    pub backoff: Duration,
    /// Limit for each individual attempt
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRIES,
            backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The `[scheduling]` section of config.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingSettings {
    /// IANA zone every event is scheduled in
    pub timezone: String,
    pub timezone_policy: TimezonePolicy,
    /// humantime duration, e.g. "1h" or "30m"
    pub meeting_duration: String,
    pub calendar_id: String,
    pub provider_timeout: String,
    pub retries: u32,
    pub retry_backoff: String,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            timezone_policy: TimezonePolicy::default(),
            meeting_duration: DEFAULT_MEETING_DURATION.to_string(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT.to_string(),
            retries: DEFAULT_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF.to_string(),
        }
    }
}

/// The `[classifier]` section of config.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Keywords matched in addition to the built-in meeting vocabulary
    pub extra_keywords: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            extra_keywords: DEFAULT_EXTRA_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Validated scheduling configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub timezone: Tz,
    pub timezone_policy: TimezonePolicy,
    pub meeting_duration: chrono::Duration,
    pub calendar_id: String,
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::Asia__Kolkata,
            timezone_policy: TimezonePolicy::default(),
            meeting_duration: chrono::Duration::hours(1),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl TryFrom<&SchedulingSettings> for SchedulerConfig {
    type Error = MailcalError;

    fn try_from(settings: &SchedulingSettings) -> MailcalResult<Self> {
        let timezone: Tz = settings.timezone.parse().map_err(|_| {
            MailcalError::Config(format!("Unknown timezone '{}'", settings.timezone))
        })?;

        let meeting_duration = parse_duration("meeting_duration", &settings.meeting_duration)?;
        let meeting_duration = chrono::Duration::from_std(meeting_duration)
            .ok()
            .filter(|d| *d <= chrono::Duration::hours(MAX_MEETING_DURATION_HOURS))
            .ok_or_else(|| {
                MailcalError::Config(format!(
                    "meeting_duration must be at most {}h",
                    MAX_MEETING_DURATION_HOURS
                ))
            })?;
        if meeting_duration <= chrono::Duration::zero() {
            return Err(MailcalError::Config(
                "meeting_duration must be longer than zero".into(),
            ));
        }

        if settings.calendar_id.trim().is_empty() {
            return Err(MailcalError::Config("calendar_id must not be empty".into()));
        }

        Ok(Self {
            timezone,
            timezone_policy: settings.timezone_policy,
            meeting_duration,
            calendar_id: settings.calendar_id.clone(),
            retry: RetryPolicy {
                max_retries: settings.retries,
                backoff: parse_duration("retry_backoff", &settings.retry_backoff)?,
                timeout: parse_duration("provider_timeout", &settings.provider_timeout)?,
            },
        })
    }
}

fn parse_duration(field: &str, value: &str) -> MailcalResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| MailcalError::Config(format!("Invalid {} '{}': {}", field, value, e)))
}
