//! Meeting date/time extraction from free text.

mod parse;
mod phrase;
mod search;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::instant::Instant;

pub use parse::parse_whole;
pub use search::{DateSpan, search_dates};

/// Extract the first schedulable instant from `text`.
///
/// Relative expressions resolve against `reference` and ambiguous ones land
/// on the nearest future occurrence. The earliest resolvable expression in
/// the text wins, even if a later one is more specific. When the span search
/// finds nothing usable the whole text gets one parse attempt on its own.
///
/// `None` means no schedulable time was found. It is not an error.
pub fn extract_meeting_datetime(text: &str, reference: NaiveDateTime) -> Option<Instant> {
    let spans = search_dates(text, reference);

    if let Some(span) = spans.iter().find(|s| s.instant.is_some()) {
        debug!(span = %span.text, "Matched date expression");
        return span.instant;
    }

    parse_whole(text, reference)
}
