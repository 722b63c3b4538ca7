//! Core of the mailcal meeting pipeline.
//!
//! This crate holds everything that does not talk to the network:
//! - `extract`: finds the first date/time expression in free text
//! - `classify`: keyword meeting-intent classifier and sender heuristics
//! - `schedule`: builds timezone-correct event requests and submits them
//!   through a `CalendarProvider`
//! - `pipeline`: the `Orchestrator` tying the above together per message
//! - `store`: the JSON message store with per-message outcome markers
//!
//! Providers (calendar, mail, language model, chat) live in other crates and
//! plug in through the traits defined here.

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod instant;
pub mod llm;
pub mod message;
pub mod notify;
pub mod pipeline;
pub mod retry;
pub mod schedule;
pub mod store;

#[cfg(test)]
mod test_support;

pub use classify::{KeywordClassifier, MeetingClassifier};
pub use config::{ClassifierSettings, SchedulerConfig, SchedulingSettings, TimezonePolicy};
pub use error::{MailcalError, MailcalResult};
pub use extract::extract_meeting_datetime;
pub use instant::Instant;
pub use message::Message;
pub use pipeline::{BatchReport, Orchestrator, Outcome};
pub use schedule::{CalendarProvider, CreatedEvent, EventRequest, EventScheduler};
pub use store::MessageStore;
