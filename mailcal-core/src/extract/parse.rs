//! Whole-text parsing for inputs the span search does not pick up.

use chrono::{DateTime, NaiveDateTime};

use super::search::parse_expression;
use crate::instant::Instant;

/// Parse the whole of `text` as one date/time, relative to `reference`.
///
/// RFC 3339 and RFC 2822 (as found in mail headers) keep their offsets.
/// Anything else goes to fuzzydate as a single phrase, which also covers
/// numeric layouts like "04.03.2026 14:45" and "2026/03/05".
pub fn parse_whole(text: &str, reference: NaiveDateTime) -> Option<Instant> {
    let trimmed = text.trim().trim_end_matches(['.', '!', '?']);
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(Instant::Fixed(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(Instant::Fixed(dt));
    }

    parse_expression(trimmed, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn rfc2822_header_style() {
        let instant = parse_whole("Tue, 3 Mar 2026 15:00:00 +0530", reference()).unwrap();
        assert_eq!(instant.offset(), FixedOffset::east_opt(5 * 3600 + 1800));
        assert_eq!(
            instant.wall_clock(),
            NaiveDate::from_ymd_opt(2026, 3, 3)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn european_dotted_date() {
        assert_eq!(
            parse_whole("04.03.2026", reference()),
            Some(Instant::Floating(
                NaiveDate::from_ymd_opt(2026, 3, 4)
                    .unwrap()
                    .and_hms_opt(9, 30, 0)
                    .unwrap()
            ))
        );
        assert_eq!(
            parse_whole("04.03.2026 14:45", reference()),
            Some(Instant::Floating(
                NaiveDate::from_ymd_opt(2026, 3, 4)
                    .unwrap()
                    .and_hms_opt(14, 45, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn single_expression() {
        assert_eq!(
            parse_whole("  noon!  ", reference()),
            Some(Instant::Floating(
                NaiveDate::from_ymd_opt(2026, 3, 2)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn bare_hour_parses_on_its_own() {
        assert_eq!(
            parse_whole("17", reference()),
            Some(Instant::Floating(
                NaiveDate::from_ymd_opt(2026, 3, 2)
                    .unwrap()
                    .and_hms_opt(17, 0, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn prose_does_not_parse() {
        assert_eq!(parse_whole("Thanks for your email", reference()), None);
        assert_eq!(parse_whole("", reference()), None);
    }
}
