//! The orchestrator: classify, extract, title, schedule, report.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::{KeywordClassifier, MeetingClassifier};
use crate::config::ClassifierSettings;
use crate::error::{MailcalError, MailcalResult};
use crate::extract::extract_meeting_datetime;
use crate::llm::TitleGenerator;
use crate::message::Message;
use crate::notify::Notifier;
use crate::schedule::{CalendarProvider, EventScheduler};
use crate::store::MessageStore;

/// Characters of the body quoted when no date could be found.
const BODY_PREVIEW_CHARS: usize = 300;

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created {
        title: String,
        start: String,
        link: String,
    },
    SkippedNoDate,
    SkippedNotMeeting,
    Failed {
        reason: String,
        /// The cause was transient (timeouts, 5xx), so a later run may succeed
        #[serde(default = "retry_by_default")]
        retryable: bool,
    },
}

fn retry_by_default() -> bool {
    true
}

impl Outcome {
    /// Final unless the message failed for a transient reason.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Outcome::Failed { retryable: true, .. })
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            Outcome::Created { link, .. } => Some(link),
            _ => None,
        }
    }
}

/// Outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub created: usize,
    pub skipped_no_date: usize,
    pub skipped_not_meeting: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created { .. } => self.created += 1,
            Outcome::SkippedNoDate => self.skipped_no_date += 1,
            Outcome::SkippedNotMeeting => self.skipped_not_meeting += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped_no_date + self.skipped_not_meeting + self.failed
    }
}

pub struct Orchestrator<C, T, N> {
    classifier: Box<dyn MeetingClassifier>,
    scheduler: EventScheduler<C>,
    titles: T,
    notifier: N,
}

impl<C, T, N> Orchestrator<C, T, N>
where
    C: CalendarProvider,
    T: TitleGenerator,
    N: Notifier,
{
    /// Orchestrator with the keyword classifier and its default extras.
    pub fn new(scheduler: EventScheduler<C>, titles: T, notifier: N) -> Self {
        Self {
            classifier: Box::new(KeywordClassifier::from(&ClassifierSettings::default())),
            scheduler,
            titles,
            notifier,
        }
    }

    pub fn with_classifier(mut self, classifier: impl MeetingClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Run one message through the pipeline.
    ///
    /// Relative dates are resolved against the message's received time, or
    /// `now` in the configured zone when it has none. Never fails: every
    /// problem is reported through the returned outcome.
    pub async fn process(&self, message: &Message, now: DateTime<Utc>) -> Outcome {
        if !self.classifier.looks_like_meeting_request(&message.body) {
            debug!(id = %message.id, "Not a meeting request");
            return Outcome::SkippedNotMeeting;
        }

        let local_now = now
            .with_timezone(&self.scheduler.config().timezone)
            .naive_local();
        let reference = message.reference_time(local_now);

        let Some(instant) = extract_meeting_datetime(&message.body, reference) else {
            info!(id = %message.id, subject = %message.subject, "No date or time found");
            self.notifier
                .notify(&format!(
                    "⚠️ Couldn't extract datetime for: {}\n\n{}...",
                    message.subject,
                    preview(&message.body)
                ))
                .await;
            return Outcome::SkippedNoDate;
        };

        let start = match self.scheduler.normalize(&instant) {
            Ok(start) => start.to_rfc3339_opts(SecondsFormat::Secs, false),
            Err(e) => {
                warn!(id = %message.id, %instant, error = %e, "Extracted time is unusable");
                return self.fail(message, &e).await;
            }
        };

        let title = self.titles.generate_title(&message.body).await;

        match self.scheduler.try_schedule(&title, &start).await {
            Ok(link) => {
                self.notifier
                    .notify(&format!(
                        "📅 *Event Scheduled!*\n*Title:* {}\n🕒 *Time:* {}\n🔗 <{}|View Event>",
                        title, start, link
                    ))
                    .await;
                Outcome::Created { title, start, link }
            }
            Err(e) => self.fail(message, &e).await,
        }
    }

    /// Process every pending message in `store`, oldest first.
    ///
    /// Each outcome is recorded and the store saved as soon as that message
    /// is done, so an interrupted batch loses at most the message in flight.
    pub async fn process_batch(
        &self,
        store: &mut MessageStore,
        now: DateTime<Utc>,
    ) -> MailcalResult<BatchReport> {
        let mut report = BatchReport::default();

        for message in store.pending() {
            let outcome = self.process(&message, now).await;
            report.record(&outcome);
            store.record_outcome(&message.id, outcome, now)?;
            store.save()?;
        }

        info!(
            total = report.total(),
            created = report.created,
            failed = report.failed,
            "Batch processed"
        );
        Ok(report)
    }

    async fn fail(&self, message: &Message, error: &MailcalError) -> Outcome {
        self.notifier
            .notify(&format!("⚠️ Failed to create event for: {}", message.subject))
            .await;
        Outcome::Failed {
            reason: error.to_string(),
            retryable: error.is_transient(),
        }
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((i, _)) => &body[..i],
        None => body,
    }
}
