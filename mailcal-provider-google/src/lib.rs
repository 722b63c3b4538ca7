//! Google-backed collaborators for mailcal.
//!
//! - `calendar::GoogleCalendar` implements `CalendarProvider` over Calendar v3
//! - `gmail::GmailClient` lists, fetches, sends and marks messages
//! - `gemini::GeminiClient` implements `TitleGenerator` and drafts summaries
//!   and replies
//!
//! All clients take an already-issued credential and a base URL, so tests
//! can point them at a local server. Every request is bounded by the
//! client's timeout (`with_timeout`, default [`DEFAULT_REQUEST_TIMEOUT`]).

use std::time::Duration;

pub mod calendar;
pub mod gemini;
pub mod gmail;

pub use calendar::GoogleCalendar;
pub use gemini::GeminiClient;
pub use gmail::GmailClient;

/// Limit for one HTTP request unless a client is given its own.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
