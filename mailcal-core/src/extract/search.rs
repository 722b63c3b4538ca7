//! Date/time span search over free text.
//!
//! Every run of up to `MAX_WINDOW` words is rewritten into fuzzydate's
//! grammar and parsed against the reference time. At each position the
//! longest run that parses wins; the result then rolls forward so that an
//! ambiguous date ("Tuesday", "Feb 10", "8am") lands in the future.

use chrono::{Datelike, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};

use super::phrase::{
    Kind, Phrase, Word, is_connector, is_month, is_number, is_numeric_date, is_weekday,
    normalize_word, rewrite, split_words,
};
use crate::instant::Instant;

/// Longest run of words handed to the parser
const MAX_WINDOW: usize = 8;

/// How far ahead to look for a month/day that exists (Feb 29 needs up to 4 years)
const YEAR_LOOKAHEAD: i32 = 8;

/// A date/time expression found in text.
#[derive(Debug, Clone, PartialEq)]
pub struct DateSpan {
    /// The matched text, exactly as written
    pub text: String,
    /// Byte range of the match in the searched text
    pub start: usize,
    pub end: usize,
    /// Resolved instant, or `None` when the expression names no real date
    /// (e.g. "February 30")
    pub instant: Option<Instant>,
}

enum Resolution {
    Resolved(NaiveDateTime),
    /// Reads as a date that does not exist
    Invalid,
    NoMatch,
}

/// Find all date/time expressions in `text`, in order of appearance.
pub fn search_dates(text: &str, reference: NaiveDateTime) -> Vec<DateSpan> {
    let words = split_words(text);
    let mut spans = Vec::new();
    let mut i = 0;

    while i < words.len() {
        match match_at(&words, i, reference) {
            Some((instant, end)) => {
                let start_byte = words[i].range.start;
                let end_byte = words[end - 1].range.end;
                spans.push(DateSpan {
                    text: text[start_byte..end_byte].to_string(),
                    start: start_byte,
                    end: end_byte,
                    instant,
                });
                i = end;
            }
            None => i += 1,
        }
    }

    spans
}

/// Parse `text` as a single date/time expression with nothing left over.
///
/// Unlike the span search this accepts phrases that only make sense on
/// their own, such as a bare hour ("17").
pub(crate) fn parse_expression(text: &str, reference: NaiveDateTime) -> Option<Instant> {
    let words = split_words(text);
    if words.is_empty() {
        return None;
    }

    match evaluate(&rewrite(&words), reference) {
        Resolution::Resolved(at) => Some(Instant::Floating(at)),
        Resolution::Invalid | Resolution::NoMatch => None,
    }
}

/// Match one span starting at word `start`. Returns its instant and the
/// index one past its last word.
fn match_at(
    words: &[Word],
    start: usize,
    reference: NaiveDateTime,
) -> Option<(Option<Instant>, usize)> {
    if let Some(instant) = timestamp(&words[start]) {
        return Some((Some(instant), start + 1));
    }
    if defers_to_date(words, start) {
        return None;
    }

    let limit = sentence_end(words, start).min(start + MAX_WINDOW);
    let mut invalid = None;

    for end in (start + 1..=limit).rev() {
        if is_connector(&words[end - 1].text) {
            continue;
        }
        let phrase = rewrite(&words[start..end]);
        if !phrase.anchored {
            continue;
        }
        match evaluate(&phrase, reference) {
            Resolution::Resolved(at) => return Some(attach_zone(words, end, at, &phrase)),
            Resolution::Invalid => {
                invalid.get_or_insert(end);
            }
            Resolution::NoMatch => {}
        }
    }

    invalid.map(|end| (None, end))
}

fn evaluate(phrase: &Phrase, reference: NaiveDateTime) -> Resolution {
    if phrase.overflows {
        return Resolution::NoMatch;
    }

    match fuzzy_parse(&phrase.input, reference) {
        Ok(at) => roll_forward(at, phrase.kind, reference)
            .map_or(Resolution::Invalid, Resolution::Resolved),
        Err(fuzzydate::Error::InvalidDate(_)) => Resolution::Invalid,
        Err(_) => Resolution::NoMatch,
    }
}

/// fuzzydate in UTC, which has no DST gaps, so the wall clock comes back as written.
fn fuzzy_parse(input: &str, reference: NaiveDateTime) -> Result<NaiveDateTime, fuzzydate::Error> {
    fuzzydate::aware_parse(input, Some(Utc.from_utc_datetime(&reference)), Utc)
        .map(|dt| dt.naive_utc())
}

/// Move an ambiguous result to its next occurrence at or after `reference`.
fn roll_forward(at: NaiveDateTime, kind: Kind, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    match kind {
        Kind::Anchored => Some(at),
        Kind::TimeOnly if at < reference => at.checked_add_signed(Duration::days(1)),
        Kind::TimeOnly => Some(at),
        Kind::Weekday { inclusive } => {
            // fuzzydate picks the reference day itself for its own weekday
            let same_day = at.date() == reference.date();
            if (same_day && !inclusive) || at < reference {
                at.checked_add_signed(Duration::weeks(1))
            } else {
                Some(at)
            }
        }
        Kind::MonthDay => (0..=YEAR_LOOKAHEAD).find_map(|years| {
            at.with_year(at.year() + years)
                .filter(|candidate| *candidate >= reference)
        }),
    }
}

/// A single-word ISO 8601 / RFC 3339 timestamp.
fn timestamp(word: &Word) -> Option<Instant> {
    let looks_iso = word.raw.starts_with(|c: char| c.is_ascii_digit()) && word.raw.contains('T');
    looks_iso.then(|| Instant::parse(&word.raw).ok()).flatten()
}

/// "Tuesday, March 3rd": the calendar date is the more specific one.
fn defers_to_date(words: &[Word], start: usize) -> bool {
    let normalized = |i: usize| words.get(i).and_then(|w| normalize_word(&w.text));

    let starts_with_weekday = normalized(start).is_some_and(|w| is_weekday(&w));
    if !starts_with_weekday || words[start].stop {
        return false;
    }

    match normalized(start + 1) {
        Some(next) if is_month(&next) || is_numeric_date(&next) => true,
        Some(next) if is_number(&next) => normalized(start + 2).is_some_and(|w| is_month(&w)),
        _ => false,
    }
}

/// Index one past the last word of the sentence containing `start`.
fn sentence_end(words: &[Word], start: usize) -> usize {
    words[start..]
        .iter()
        .position(|w| w.stop)
        .map_or(words.len(), |i| start + i + 1)
}

/// Attach a zone written right after the phrase ("10:00 UTC", "3pm +05:30").
fn attach_zone(
    words: &[Word],
    end: usize,
    at: NaiveDateTime,
    phrase: &Phrase,
) -> (Option<Instant>, usize) {
    let zone = words
        .get(end)
        .filter(|_| phrase.has_time && !words[end - 1].stop)
        .and_then(|w| zone_offset(&w.text));

    match zone.and_then(|offset| offset.from_local_datetime(&at).single()) {
        Some(dt) => (Some(Instant::Fixed(dt)), end + 1),
        None => (Some(Instant::Floating(at)), end),
    }
}

/// "utc", "gmt", "z", "utc+2", "+05:30", "-0800"
fn zone_offset(word: &str) -> Option<FixedOffset> {
    let rest = word
        .strip_prefix("utc")
        .or_else(|| word.strip_prefix("gmt"))
        .unwrap_or(word);
    if rest.is_empty() || rest == "z" {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let (hours, minutes) = match digits.split_once(':') {
        Some(parts) => parts,
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if !is_number(hours) || !is_number(minutes) || hours.len() > 2 {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Monday 2 March 2026, 09:30
    fn monday_morning() -> NaiveDateTime {
        at(2026, 3, 2, 9, 30)
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn first(text: &str, reference: NaiveDateTime) -> Option<Instant> {
        search_dates(text, reference).into_iter().find_map(|s| s.instant)
    }

    fn floating(y: i32, m: u32, d: u32, h: u32, min: u32) -> Option<Instant> {
        Some(Instant::Floating(at(y, m, d, h, min)))
    }

    #[test]
    fn next_weekday_with_time() {
        let spans = search_dates(
            "Can we meet next Tuesday at 3pm to discuss the proposal?",
            monday_morning(),
        );
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "next Tuesday at 3pm");
        assert_eq!(spans[0].instant, floating(2026, 3, 3, 15, 0));
    }

    #[test]
    fn bare_weekday_same_day_goes_a_week_ahead() {
        assert_eq!(first("see you Monday", monday_morning()), floating(2026, 3, 9, 9, 30));
        assert_eq!(first("this Monday at noon", monday_morning()), floating(2026, 3, 2, 12, 0));
        assert_eq!(first("this Monday at 8am", monday_morning()), floating(2026, 3, 9, 8, 0));
        assert_eq!(first("last friday", monday_morning()), floating(2026, 2, 27, 9, 30));
    }

    #[test]
    fn month_day_prefers_future_year() {
        assert_eq!(
            first("March 3rd at 10am works", monday_morning()),
            floating(2026, 3, 3, 10, 0)
        );
        assert_eq!(
            first("how about Feb 10 at 2:30pm", monday_morning()),
            floating(2027, 2, 10, 14, 30)
        );
        assert_eq!(
            first("on the 3rd of March", monday_morning()),
            floating(2026, 3, 3, 9, 30)
        );
    }

    #[test]
    fn same_day_earlier_time_rolls_to_next_year() {
        assert_eq!(
            first("March 2 at 9am", monday_morning()),
            floating(2027, 3, 2, 9, 0)
        );
    }

    #[test]
    fn date_on_the_reference_day_is_not_in_the_past() {
        // No time of day given: the reference time is used, so the date stays
        assert_eq!(first("March 2 works", monday_morning()), floating(2026, 3, 2, 9, 30));
        assert_eq!(first("this Monday", monday_morning()), floating(2026, 3, 2, 9, 30));
    }

    #[test]
    fn explicit_year_is_kept_even_in_the_past() {
        assert_eq!(
            first("It happened on March 3, 2024.", monday_morning()),
            floating(2024, 3, 3, 9, 30)
        );
    }

    #[test]
    fn bare_time_rolls_to_tomorrow_when_past() {
        assert_eq!(first("call at 3pm", monday_morning()), floating(2026, 3, 2, 15, 0));
        assert_eq!(first("call at 8am", monday_morning()), floating(2026, 3, 3, 8, 0));
    }

    #[test]
    fn relative_days_keep_reference_time() {
        assert_eq!(first("tomorrow works", monday_morning()), floating(2026, 3, 3, 9, 30));
        assert_eq!(first("tomorrow at 11:15", monday_morning()), floating(2026, 3, 3, 11, 15));
        assert_eq!(first("in 2 days", monday_morning()), floating(2026, 3, 4, 9, 30));
        assert_eq!(first("in an hour", monday_morning()), floating(2026, 3, 2, 10, 30));
        assert_eq!(first("3 weeks from now", monday_morning()), floating(2026, 3, 23, 9, 30));
        assert_eq!(first("tonight", monday_morning()), floating(2026, 3, 2, 20, 0));
        assert_eq!(
            first("the day after tomorrow at noon", monday_morning()),
            floating(2026, 3, 4, 12, 0)
        );
    }

    #[test]
    fn weekday_then_calendar_date_uses_the_date() {
        assert_eq!(
            first("Thursday, March 12th at 4 pm", monday_morning()),
            floating(2026, 3, 12, 16, 0)
        );
    }

    #[test]
    fn zone_suffix_yields_fixed_instant() {
        let instant = first("Friday 10:00 UTC", monday_morning()).unwrap();
        assert_eq!(instant.wall_clock(), at(2026, 3, 6, 10, 0));
        assert_eq!(instant.offset(), FixedOffset::east_opt(0));

        let instant = first("2026-03-10T09:00:00-05:00", monday_morning()).unwrap();
        assert_eq!(instant.offset(), FixedOffset::west_opt(5 * 3600));

        let spans = search_dates("Tue, 3 Mar 2026 15:00:00 +0530", monday_morning());
        assert_eq!(spans[0].text, "3 Mar 2026 15:00:00 +0530");
        let instant = spans[0].instant.unwrap();
        assert_eq!(instant.wall_clock(), at(2026, 3, 3, 15, 0));
        assert_eq!(instant.offset(), FixedOffset::east_opt(5 * 3600 + 1800));
    }

    #[test]
    fn zone_offsets() {
        assert_eq!(zone_offset("gmt"), FixedOffset::east_opt(0));
        assert_eq!(zone_offset("utc+2"), FixedOffset::east_opt(2 * 3600));
        assert_eq!(zone_offset("-0800"), FixedOffset::west_opt(8 * 3600));
        assert_eq!(zone_offset("+05:30"), FixedOffset::east_opt(5 * 3600 + 1800));
        assert_eq!(zone_offset("+99"), None);
        assert_eq!(zone_offset("people"), None);
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(first("due 2026-04-01", monday_morning()), floating(2026, 4, 1, 9, 30));
        assert_eq!(first("on 4/1 at 9:00", monday_morning()), floating(2026, 4, 1, 9, 0));
        assert_eq!(first("on 05.03.2026", monday_morning()), floating(2026, 3, 5, 9, 30));
    }

    #[test]
    fn impossible_date_is_a_null_span() {
        let spans = search_dates("February 30 at 10am, or March 5", monday_morning());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "February 30 at 10am");
        assert_eq!(spans[0].instant, None);
        assert_eq!(spans[1].instant, floating(2026, 3, 5, 9, 30));
    }

    #[test]
    fn spans_come_back_in_order() {
        let spans = search_dates(
            "Tuesday at 3pm works. Otherwise Friday at 10am.",
            monday_morning(),
        );
        let texts: Vec<_> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Tuesday at 3pm", "Friday at 10am"]);
    }

    #[test]
    fn ordinary_words_are_not_dates() {
        assert!(search_dates("Thanks for your email", monday_morning()).is_empty());
        assert!(search_dates("May I sit in the sun on Sat?", monday_morning()).is_empty());
        assert!(search_dates("I have 3 questions about the March release", monday_morning()).is_empty());
        assert!(search_dates("I'm busy right now", monday_morning()).is_empty());
    }

    #[test]
    fn huge_offsets_are_ignored() {
        assert!(search_dates("in 99999999 weeks from now", monday_morning()).is_empty());
        assert!(search_dates("a year from now", at(2028, 2, 29, 9, 0)).is_empty());
    }

    #[test]
    fn sentence_break_splits_spans() {
        let spans = search_dates("See you Tuesday. 3pm is my only slot", monday_morning());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Tuesday");
    }

    #[test]
    fn parse_expression_requires_whole_text() {
        assert_eq!(parse_expression("3pm", monday_morning()), floating(2026, 3, 2, 15, 0));
        assert_eq!(parse_expression("3pm sounds good", monday_morning()), None);
    }
}
