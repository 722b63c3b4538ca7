//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{MailcalError, MailcalResult};
use crate::llm::TitleGenerator;
use crate::notify::Notifier;
use crate::schedule::{CalendarProvider, CreatedEvent, EventRequest};

/// Records every insert; pops queued errors before succeeding.
#[derive(Clone, Default)]
pub(crate) struct FakeCalendar {
    requests: Arc<Mutex<Vec<(String, EventRequest)>>>,
    failures: Arc<Mutex<VecDeque<MailcalError>>>,
    no_links: bool,
}

impl FakeCalendar {
    pub(crate) fn failing(errors: Vec<MailcalError>) -> Self {
        Self {
            failures: Arc::new(Mutex::new(errors.into())),
            ..Self::default()
        }
    }

    pub(crate) fn without_links() -> Self {
        Self {
            no_links: true,
            ..Self::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<(String, EventRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

impl CalendarProvider for FakeCalendar {
    async fn insert_event(
        &self,
        calendar_id: &str,
        request: &EventRequest,
    ) -> MailcalResult<CreatedEvent> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((calendar_id.to_string(), request.clone()));
            requests.len()
        };

        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        let id = format!("evt{}", count);
        Ok(CreatedEvent {
            html_link: (!self.no_links)
                .then(|| format!("https://calendar.example.com/event?eid={}", id)),
            id,
        })
    }
}

/// Always answers with the same title.
#[derive(Clone)]
pub(crate) struct FixedTitle(pub(crate) &'static str);

impl TitleGenerator for FixedTitle {
    async fn generate_title(&self, _body: &str) -> String {
        self.0.to_string()
    }
}

/// Collects notifications instead of sending them.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.sent.lock().unwrap().push(text.to_string());
    }
}
