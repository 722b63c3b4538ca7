//! Email messages as the pipeline sees them.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A fetched email message. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    pub subject: String,
    /// Parsed `Date` header, if the message had a usable one
    pub received_at: Option<DateTime<FixedOffset>>,
    /// Plain-text body
    pub body: String,
}

impl Message {
    /// Wall-clock reference for resolving relative dates in the body.
    /// Falls back to `now` when the message has no received time.
    pub fn reference_time(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.received_at
            .map(|dt| dt.naive_local())
            .unwrap_or(now)
    }
}
