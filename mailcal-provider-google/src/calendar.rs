//! Google Calendar v3 REST client.

use std::time::Duration;

use mailcal_core::error::{MailcalError, MailcalResult};
use mailcal_core::schedule::{CalendarProvider, CreatedEvent, EventRequest};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::DEFAULT_REQUEST_TIMEOUT;

pub const CALENDAR_API_URL: &str = "https://www.googleapis.com";

/// Creates events with an already-issued OAuth access token.
#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    timeout: Duration,
    base_url: String,
    access_token: String,
}

impl GoogleCalendar {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(CALENDAR_API_URL, access_token)
    }

    /// Point the client at another host (a test server, a proxy).
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Give up on a request that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn events_url(&self, calendar_id: &str) -> MailcalResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MailcalError::Config(format!("Invalid calendar URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| MailcalError::Config("Calendar URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(["calendar", "v3", "calendars", calendar_id, "events"]);
        Ok(url)
    }
}

impl CalendarProvider for GoogleCalendar {
    async fn insert_event(
        &self,
        calendar_id: &str,
        request: &EventRequest,
    ) -> MailcalResult<CreatedEvent> {
        let url = self.events_url(calendar_id)?;
        debug!(%url, summary = %request.summary, "Inserting event");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailcalError::ProviderTimeout(self.timeout.as_secs())
                } else {
                    MailcalError::ProviderTransient(format!("Calendar request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Calendar API returned {}: {}", status, body.trim());
            return Err(if is_transient(status) {
                MailcalError::ProviderTransient(message)
            } else {
                MailcalError::Provider(message)
            });
        }

        response
            .json()
            .await
            .map_err(|e| MailcalError::Provider(format!("Unexpected calendar response: {}", e)))
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
