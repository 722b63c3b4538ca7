//! Event scheduling: normalize an instant and create a calendar event.

use std::future::Future;

use chrono::{DateTime, SecondsFormat, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::{SchedulerConfig, TimezonePolicy};
use crate::error::{MailcalError, MailcalResult};
use crate::instant::Instant;
use crate::retry::with_retry;

/// Event-creation payload, shaped like the calendar provider's REST body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub summary: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 with the zone's offset, e.g. "2026-03-03T15:00:00+05:30"
    pub date_time: String,
    /// IANA zone name, e.g. "Asia/Kolkata"
    pub time_zone: String,
}

impl EventDateTime {
    fn new(dt: &DateTime<Tz>) -> Self {
        Self {
            date_time: dt.to_rfc3339_opts(SecondsFormat::Secs, false),
            time_zone: dt.timezone().name().to_string(),
        }
    }
}

/// What the provider hands back for a created event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: String,
    pub html_link: Option<String>,
}

/// The external calendar service.
pub trait CalendarProvider: Send + Sync {
    fn insert_event(
        &self,
        calendar_id: &str,
        request: &EventRequest,
    ) -> impl Future<Output = MailcalResult<CreatedEvent>> + Send;
}

/// Place `instant` in the configured zone, zeroing seconds.
///
/// Under `TimezonePolicy::Relabel` any zone the instant carries is discarded
/// and its wall-clock reading is taken as local time in the target zone.
/// Under `Convert` zoned instants are converted. A local time that does not
/// exist in the target zone (a DST gap) is malformed.
pub fn normalize(instant: &Instant, config: &SchedulerConfig) -> MailcalResult<DateTime<Tz>> {
    let tz = config.timezone;

    let normalized = match (config.timezone_policy, instant) {
        (TimezonePolicy::Convert, Instant::Fixed(dt)) => Some(dt.with_timezone(&tz)),
        _ => tz.from_local_datetime(&instant.wall_clock()).earliest(),
    };

    normalized
        .and_then(|dt| dt.with_second(0))
        .and_then(|dt| dt.with_nanosecond(0))
        .ok_or_else(|| {
            MailcalError::MalformedInstant(format!("{} does not exist in {}", instant, tz.name()))
        })
}

/// Turns a title and a start time into a calendar event.
///
/// Holds no state between calls: scheduling the same title and start twice
/// sends two independent requests.
pub struct EventScheduler<C> {
    calendar: C,
    config: SchedulerConfig,
}

impl<C: CalendarProvider> EventScheduler<C> {
    pub fn new(calendar: C, config: SchedulerConfig) -> Self {
        Self { calendar, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate `start`, place it in the configured zone and build the request.
    pub fn build_request(&self, title: &str, start: &str) -> MailcalResult<EventRequest> {
        let instant = Instant::parse(start)?;
        let start = self.normalize(&instant)?;
        let end = start
            .checked_add_signed(self.config.meeting_duration)
            .ok_or_else(|| {
                MailcalError::MalformedInstant(format!(
                    "{} plus the meeting duration is out of range",
                    instant
                ))
            })?;

        Ok(EventRequest {
            summary: title.to_string(),
            start: EventDateTime::new(&start),
            end: EventDateTime::new(&end),
        })
    }

    pub fn normalize(&self, instant: &Instant) -> MailcalResult<DateTime<Tz>> {
        normalize(instant, &self.config)
    }

    /// Create an event and return its web link.
    ///
    /// Every failure (unparseable start, nonexistent local time, provider
    /// error after retries) is logged and comes back as `None`.
    pub async fn schedule(&self, title: &str, start: &str) -> Option<String> {
        self.try_schedule(title, start).await.ok()
    }

    /// [`EventScheduler::schedule`], keeping the error so callers can tell
    /// a transient provider failure from a permanent one.
    pub async fn try_schedule(&self, title: &str, start: &str) -> MailcalResult<String> {
        let request = self.build_request(title, start).inspect_err(|e| {
            warn!(start, error = %e, "Could not build event request");
        })?;

        let calendar = &self.calendar;
        let calendar_id = self.config.calendar_id.as_str();
        let payload = &request;
        let result = with_retry(&self.config.retry, "insert_event", move || {
            calendar.insert_event(calendar_id, payload)
        })
        .await;

        match result {
            Ok(CreatedEvent {
                html_link: Some(link),
                ..
            }) => {
                info!(summary = %request.summary, start = %request.start.date_time, %link, "Event created");
                Ok(link)
            }
            Ok(created) => {
                warn!(event_id = %created.id, "Provider created the event but returned no link");
                Err(MailcalError::Provider(format!(
                    "event {} was created without a link",
                    created.id
                )))
            }
            Err(e) => {
                error!(summary = %request.summary, error = %e, "Calendar error");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::test_support::FakeCalendar;
    use std::time::Duration;

    fn config(timezone: Tz, policy: TimezonePolicy) -> SchedulerConfig {
        SchedulerConfig {
            timezone,
            timezone_policy: policy,
            retry: RetryPolicy {
                max_retries: 1,
                backoff: Duration::from_millis(1),
                timeout: Duration::from_secs(1),
            },
            ..SchedulerConfig::default()
        }
    }

    fn scheduler(calendar: FakeCalendar) -> EventScheduler<FakeCalendar> {
        EventScheduler::new(calendar, config(Tz::Asia__Kolkata, TimezonePolicy::Relabel))
    }

    #[test]
    fn request_carries_zone_and_default_hour() {
        let request = scheduler(FakeCalendar::default())
            .build_request("Proposal review", "2026-03-03T15:00:00")
            .unwrap();

        assert_eq!(request.summary, "Proposal review");
        assert_eq!(request.start.date_time, "2026-03-03T15:00:00+05:30");
        assert_eq!(request.start.time_zone, "Asia/Kolkata");
        assert_eq!(request.end.date_time, "2026-03-03T16:00:00+05:30");
        assert_eq!(request.end.time_zone, "Asia/Kolkata");
    }

    #[test]
    fn relabels_instead_of_converting() {
        let request = scheduler(FakeCalendar::default())
            .build_request("Sync", "2026-03-03T10:00:00-05:00")
            .unwrap();

        // Same wall clock, new zone
        assert_eq!(request.start.date_time, "2026-03-03T10:00:00+05:30");
        assert_eq!(request.start.time_zone, "Asia/Kolkata");
    }

    #[test]
    fn convert_policy_converts() {
        let scheduler = EventScheduler::new(
            FakeCalendar::default(),
            config(Tz::Asia__Kolkata, TimezonePolicy::Convert),
        );
        let request = scheduler.build_request("Sync", "2026-03-03T10:00:00+00:00").unwrap();
        assert_eq!(request.start.date_time, "2026-03-03T15:30:00+05:30");

        // Floating instants have nothing to convert from
        let request = scheduler.build_request("Sync", "2026-03-03T10:00:00").unwrap();
        assert_eq!(request.start.date_time, "2026-03-03T10:00:00+05:30");
    }

    #[test]
    fn seconds_are_zeroed() {
        let request = scheduler(FakeCalendar::default())
            .build_request("Sync", "2026-03-03T15:00:45")
            .unwrap();
        assert_eq!(request.start.date_time, "2026-03-03T15:00:00+05:30");
    }

    #[test]
    fn configured_duration_sets_end() {
        let mut cfg = config(Tz::Europe__London, TimezonePolicy::Relabel);
        cfg.meeting_duration = chrono::Duration::minutes(30);
        let request = EventScheduler::new(FakeCalendar::default(), cfg)
            .build_request("Sync", "2026-07-01T09:00:00")
            .unwrap();
        assert_eq!(request.start.date_time, "2026-07-01T09:00:00+01:00");
        assert_eq!(request.end.date_time, "2026-07-01T09:30:00+01:00");
        assert_eq!(request.end.time_zone, "Europe/London");
    }

    #[test]
    fn end_past_the_calendar_range_is_malformed() {
        let mut cfg = config(Tz::UTC, TimezonePolicy::Relabel);
        cfg.meeting_duration = chrono::Duration::days(365 * 300_000);
        let scheduler = EventScheduler::new(FakeCalendar::default(), cfg);

        assert!(matches!(
            scheduler.build_request("Sync", "2026-03-03T15:00:00"),
            Err(MailcalError::MalformedInstant(_))
        ));
    }

    #[tokio::test]
    async fn malformed_start_makes_no_provider_call() {
        let calendar = FakeCalendar::default();
        let scheduler = scheduler(calendar.clone());

        assert_eq!(scheduler.schedule("Sync", "next tuesday-ish").await, None);
        assert!(calendar.requests().is_empty());
    }

    #[tokio::test]
    async fn nonexistent_local_time_is_malformed() {
        let calendar = FakeCalendar::default();
        let scheduler = EventScheduler::new(
            calendar.clone(),
            config(Tz::America__New_York, TimezonePolicy::Relabel),
        );

        // Clocks jump from 02:00 to 03:00 on 8 March 2026
        assert!(matches!(
            scheduler.build_request("Sync", "2026-03-08T02:30:00"),
            Err(MailcalError::MalformedInstant(_))
        ));
        assert_eq!(scheduler.schedule("Sync", "2026-03-08T02:30:00").await, None);
        assert!(calendar.requests().is_empty());
    }

    #[tokio::test]
    async fn success_returns_link() {
        let calendar = FakeCalendar::default();
        let link = scheduler(calendar.clone())
            .schedule("Sync", "2026-03-03T15:00:00")
            .await;

        assert_eq!(link.as_deref(), Some("https://calendar.example.com/event?eid=evt1"));
        let requests = calendar.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "primary");
    }

    #[tokio::test]
    async fn scheduling_twice_sends_two_fresh_requests() {
        let calendar = FakeCalendar::default();
        let scheduler = scheduler(calendar.clone());

        let first = scheduler.schedule("Sync", "2026-03-03T15:00:00").await;
        let second = scheduler.schedule("Sync", "2026-03-03T15:00:00").await;

        assert!(first.is_some());
        assert!(second.is_some());
        let requests = calendar.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn provider_failure_becomes_none() {
        let calendar = FakeCalendar::failing(vec![MailcalError::Provider("403 Forbidden".into())]);
        let link = scheduler(calendar.clone())
            .schedule("Sync", "2026-03-03T15:00:00")
            .await;

        assert_eq!(link, None);
        assert_eq!(calendar.requests().len(), 1);
    }

    #[tokio::test]
    async fn try_schedule_keeps_the_error() {
        let calendar = FakeCalendar::failing(vec![
            MailcalError::ProviderTransient("503".into()),
            MailcalError::ProviderTransient("503".into()),
        ]);
        let err = scheduler(calendar.clone())
            .try_schedule("Sync", "2026-03-03T15:00:00")
            .await
            .unwrap_err();
        assert!(err.is_transient());

        let err = scheduler(FakeCalendar::without_links())
            .try_schedule("Sync", "2026-03-03T15:00:00")
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let calendar = FakeCalendar::failing(vec![
            MailcalError::ProviderTransient("503 Service Unavailable".into()),
        ]);
        let link = scheduler(calendar.clone())
            .schedule("Sync", "2026-03-03T15:00:00")
            .await;

        assert!(link.is_some());
        assert_eq!(calendar.requests().len(), 2);
    }

    #[tokio::test]
    async fn missing_link_is_a_failure() {
        let calendar = FakeCalendar::without_links();
        let link = scheduler(calendar.clone())
            .schedule("Sync", "2026-03-03T15:00:00")
            .await;
        assert_eq!(link, None);
    }
}
