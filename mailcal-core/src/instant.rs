//! Candidate instants produced by the extractor.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{MailcalError, MailcalResult};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A point in time, with or without an attached UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instant {
    /// Wall-clock time with no zone information
    Floating(NaiveDateTime),
    /// Time with an explicit offset (the source text named UTC, GMT or +hh:mm)
    Fixed(DateTime<FixedOffset>),
}

impl Instant {
    /// The wall-clock reading of this instant in whatever zone it carries.
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            Instant::Floating(dt) => *dt,
            Instant::Fixed(dt) => dt.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Instant::Floating(_) => None,
            Instant::Fixed(dt) => Some(*dt.offset()),
        }
    }

    /// Parse an ISO-8601 instant: RFC 3339 with offset, or naive `YYYY-MM-DDTHH:MM[:SS]`.
    /// A space is accepted in place of the `T`.
    pub fn parse(input: &str) -> MailcalResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MailcalError::MalformedInstant("empty string".into()));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Instant::Fixed(dt));
        }

        let normalized = trimmed.replacen(' ', "T", 1);
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
            .map(Instant::Floating)
            .ok_or_else(|| MailcalError::MalformedInstant(format!("\"{}\"", trimmed)))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instant::Floating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Instant::Fixed(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
        }
    }
}
