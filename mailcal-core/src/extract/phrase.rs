//! Words of free text, rewritten into the phrase grammar fuzzydate parses.

use std::ops::Range;

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const MONTHS: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const UNITS: &[&str] = &[
    "min", "mins", "minute", "minutes", "hour", "hours", "day", "days", "week", "weeks", "month",
    "months", "year", "years",
];

const RELATIVE_DAYS: &[&str] = &["today", "tomorrow", "yesterday"];

/// Words that turn an amount of time into a point in time
const OFFSET_WORDS: &[&str] = &["ago", "from", "after", "before", "next", "last"];

/// Abbreviations that are also ordinary English words ("sun", "sat").
/// They only name a weekday next to a time of day.
const AMBIGUOUS_ABBREVIATIONS: &[&str] = &["sat", "sun"];

/// A phrase never ends on one of these
const CONNECTORS: &[&str] = &[
    "a", "an", "and", "around", "at", "by", "coming", "from", "in", "last", "next", "of", "on",
    "the", "this",
];

/// Larger amounts overflow fuzzydate's date arithmetic
const MAX_DIGITS: usize = 4;
const LARGE_NUMBER_WORDS: &[&str] = &["thousand", "million", "billion"];

/// "tonight" without a time
const TONIGHT: &str = "8pm";

/// A whitespace-delimited word with its surrounding punctuation removed.
#[derive(Debug, Clone)]
pub(crate) struct Word {
    /// Byte range of the word in the source text
    pub range: Range<usize>,
    pub raw: String,
    /// Lowercased `raw`
    pub text: String,
    /// A comma followed the word
    pub comma: bool,
    /// Sentence punctuation followed the word. Phrases never run past it.
    pub stop: bool,
}

pub(crate) fn split_words(text: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                words.extend(word(text, s, i));
                start = None;
            }
            _ => {}
        }
    }

    words
}

fn word(text: &str, start: usize, end: usize) -> Option<Word> {
    let chunk = &text[start..end];
    let body = chunk.trim_start_matches(['(', '[', '{', '<', '"', '\'', '“', '‘']);
    let lead = chunk.len() - body.len();
    let core = body.trim_end_matches([
        '.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '"', '\'', '”', '’',
    ]);
    if core.is_empty() {
        return None;
    }

    let mut tail = &body[core.len()..];
    let lower = core.to_lowercase();
    // "p.m." keeps its final dot
    if lower.ends_with("a.m") || lower.ends_with("p.m") {
        tail = tail.strip_prefix('.').unwrap_or(tail);
    }

    let begin = start + lead;
    Some(Word {
        range: begin..begin + core.len(),
        raw: core.to_string(),
        text: lower,
        comma: tail.contains(','),
        stop: tail.contains(['.', ';', ':', '!', '?']),
    })
}

/// What decides the final date once fuzzydate has read a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// The text pins the date down ("tomorrow", "in 2 days", "March 3, 2026")
    Anchored,
    /// A weekday. `inclusive` when "this" lets it fall on the reference day.
    Weekday { inclusive: bool },
    /// Month and day without a year
    MonthDay,
    /// A time of day only
    TimeOnly,
}

/// A run of words rewritten for fuzzydate.
#[derive(Debug, Clone)]
pub(crate) struct Phrase {
    pub input: String,
    pub kind: Kind,
    pub has_time: bool,
    /// Names a date or time rather than being a bare number or ordinary words
    pub anchored: bool,
    /// fuzzydate would overflow or panic evaluating it
    pub overflows: bool,
}

/// Rewrite `words` into fuzzydate's grammar.
///
/// fuzzydate reads one complete phrase and rejects anything else, so the
/// English it does not know is reshaped first: ordinals lose their suffix,
/// "in 2 days" becomes "2 days from now", "3rd of March" becomes "march 3",
/// and "next"/"this" before a weekday are dropped after noting which one it
/// was.
pub(crate) fn rewrite(words: &[Word]) -> Phrase {
    let ambiguous = words
        .iter()
        .any(|w| AMBIGUOUS_ABBREVIATIONS.contains(&w.text.as_str()));
    let tokens: Vec<(String, bool)> = words
        .iter()
        .filter_map(|w| normalize_word(&w.text).map(|token| (token, w.comma)))
        .collect();

    let mut out: Vec<String> = Vec::new();
    let mut inclusive = false;
    let mut tonight = false;
    let mut i = 0;

    if tokens.len() >= 3 && tokens[0].0 == "in" && is_unit(&tokens[2].0) {
        out.extend([
            tokens[1].0.clone(),
            tokens[2].0.clone(),
            "from".to_string(),
            "now".to_string(),
        ]);
        i = 3;
    }

    while i < tokens.len() {
        let (token, mut comma) = (tokens[i].0.as_str(), tokens[i].1);
        let next = tokens.get(i + 1).map(|(t, _)| t.as_str());
        let after_next = tokens.get(i + 2).map(|(t, _)| t.as_str());

        if token == "coming" || (token == "this" && next == Some("coming")) {
            // "this coming Tuesday" is the upcoming one
        } else if matches!(token, "this" | "next") && next.is_some_and(is_weekday) {
            inclusive = token == "this";
        } else if token == "tonight" {
            tonight = true;
            out.push("today".to_string());
        } else if let Some(month) = next.filter(|n| is_number(token) && is_month(n)) {
            if after_next.is_some_and(is_number) {
                out.push(token.to_string());
            } else {
                out.push(month.to_string());
                out.push(token.to_string());
                comma = tokens[i + 1].1;
                i += 1;
            }
        } else {
            out.push(token.to_string());
        }

        i += 1;
        if comma && i < tokens.len() && !is_year(&tokens[i].0) {
            out.push(",".to_string());
        }
    }

    let mut has_time = has_time_component(&out);
    if tonight && !has_time {
        out.push(TONIGHT.to_string());
        has_time = true;
    }

    let contains = |set: &[&str]| out.iter().any(|t| set.contains(&t.as_str()));
    let weekday = contains(WEEKDAYS);
    let month = contains(MONTHS);
    let units = contains(UNITS);
    let relative_day = contains(RELATIVE_DAYS);
    let offset = units && contains(OFFSET_WORDS);
    let numeric_date = out.iter().any(|t| numeric_date_parts(t) > 0);
    let full_date = out.iter().any(|t| is_year(t) || numeric_date_parts(t) == 3);

    let kind = if relative_day || units || full_date || contains(&["last"]) {
        Kind::Anchored
    } else if weekday {
        Kind::Weekday { inclusive }
    } else if month || numeric_date {
        Kind::MonthDay
    } else {
        Kind::TimeOnly
    };

    let names_weekday = weekday && (has_time || !ambiguous);
    let anchored = names_weekday || month || numeric_date || relative_day || offset || has_time;

    // fuzzydate's year arithmetic unwraps and panics from Feb 29
    let year_offset =
        contains(&["year", "years"]) && contains(&["ago", "from", "after", "before", "in"]);
    let overflows = year_offset
        || out.iter().any(|t| {
            LARGE_NUMBER_WORDS.contains(&t.as_str())
                || t.split(|c: char| !c.is_ascii_digit()).any(|run| run.len() > MAX_DIGITS)
        });

    Phrase {
        input: out.join(" "),
        kind,
        has_time,
        anchored,
        overflows,
    }
}

/// Rewrite one word in isolation. `None` drops it.
pub(crate) fn normalize_word(word: &str) -> Option<String> {
    match word {
        "of" | "o'clock" | "oclock" => return None,
        "midday" => return Some("noon".to_string()),
        _ => {}
    }

    let word = match word.strip_suffix("a.m").or_else(|| word.strip_suffix("p.m")) {
        Some(number) => format!("{}{}m", number, &word[number.len()..number.len() + 1]),
        None => word.to_string(),
    };
    let word = drop_seconds(&word).unwrap_or(word);
    let word = strip_ordinal(&word).unwrap_or(word);

    Some(expand_abbreviations(&word))
}

/// Expand weekday and month abbreviations to full names.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs: &[(&str, &str)] = &[
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| (*full).to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "15:00:00" -> "15:00"
fn drop_seconds(word: &str) -> Option<String> {
    let parts: Vec<&str> = word.split(':').collect();
    (parts.len() == 3 && parts.iter().all(|p| is_number(p)))
        .then(|| format!("{}:{}", parts[0], parts[1]))
}

/// "3rd" -> "3"
fn strip_ordinal(word: &str) -> Option<String> {
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .filter(|number| is_number(number))
        .map(str::to_string)
}

/// Whether the phrase names a time of day: am/pm, HH:MM, noon or midnight.
fn has_time_component(tokens: &[String]) -> bool {
    tokens.iter().enumerate().any(|(i, token)| {
        let meridiem = token
            .strip_suffix("am")
            .or_else(|| token.strip_suffix("pm"));
        matches!(token.as_str(), "noon" | "midnight")
            || token
                .split_once(':')
                .is_some_and(|(h, m)| is_number(h) && m.starts_with(|c: char| c.is_ascii_digit()))
            || meridiem.is_some_and(|rest| rest.ends_with(|c: char| c.is_ascii_digit()))
            || (meridiem == Some("")
                && i > 0
                && tokens[i - 1].ends_with(|c: char| c.is_ascii_digit()))
    })
}

/// Number of parts in "4/1", "2026-04-01" or "05.03.2026"; 0 if not a date.
/// Dashes and dots only make a date with all three parts.
fn numeric_date_parts(token: &str) -> usize {
    for separator in ['/', '-', '.'] {
        let parts: Vec<&str> = token.split(separator).collect();
        if parts.len() > 1 && parts.iter().all(|p| is_number(p)) {
            return match parts.len() {
                3 => 3,
                2 if separator == '/' => 2,
                _ => 0,
            };
        }
    }
    0
}

pub(crate) fn is_weekday(token: &str) -> bool {
    WEEKDAYS.contains(&token)
}

pub(crate) fn is_month(token: &str) -> bool {
    MONTHS.contains(&token)
}

pub(crate) fn is_numeric_date(token: &str) -> bool {
    numeric_date_parts(token) > 0
}

pub(crate) fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn is_connector(token: &str) -> bool {
    CONNECTORS.contains(&token)
}

fn is_unit(token: &str) -> bool {
    UNITS.contains(&token)
}

fn is_year(token: &str) -> bool {
    token.len() == 4 && is_number(token)
}
