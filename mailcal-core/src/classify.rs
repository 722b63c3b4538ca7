//! Message classification: meeting intent, human senders, questions.

use crate::config::ClassifierSettings;

/// Words whose presence suggests the message is about something to schedule.
pub const MEETING_KEYWORDS: &[&str] = &[
    "interview",
    "meeting",
    "date",
    "time",
    "schedule",
    "appointment",
    "call",
    "event",
    "calendar",
    "reminder",
];

/// Added on top of [`MEETING_KEYWORDS`] by the default `[classifier]`
/// settings. Plain invitations ("can we meet Tuesday") use none of them.
pub const DEFAULT_EXTRA_KEYWORDS: &[&str] = &["meet"];

/// Sender fragments that mark automated mail.
const AUTOMATED_SENDER_MARKERS: &[&str] = &[
    "no-reply",
    "noreply",
    "newsletter",
    "slack",
    "notification",
    "mailer",
    "mailbot",
    "automated",
];

/// Decides whether a message body plausibly asks for something to be scheduled.
pub trait MeetingClassifier: Send + Sync {
    fn looks_like_meeting_request(&self, body: &str) -> bool;
}

/// Case-insensitive substring match against a keyword list.
///
/// Deliberately coarse: a false positive only costs an extraction pass that
/// finds nothing.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Exactly [`MEETING_KEYWORDS`].
    pub fn new() -> Self {
        Self::with_keywords(MEETING_KEYWORDS.iter().copied())
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl KeywordClassifier {
    pub fn with_extra_keywords<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords
            .extend(extra.into_iter().map(|k| k.as_ref().to_lowercase()));
        self
    }
}

/// [`MEETING_KEYWORDS`] plus the configured extras.
impl From<&ClassifierSettings> for KeywordClassifier {
    fn from(settings: &ClassifierSettings) -> Self {
        Self::new().with_extra_keywords(&settings.extra_keywords)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MeetingClassifier for KeywordClassifier {
    fn looks_like_meeting_request(&self, body: &str) -> bool {
        let lower = body.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// False for bots, newsletters and notification senders.
pub fn is_human_sender(sender: &str) -> bool {
    let lower = sender.to_lowercase();
    AUTOMATED_SENDER_MARKERS
        .iter()
        .all(|marker| !lower.contains(marker))
}

/// Sentences in `text` that end with a question mark.
pub fn extract_questions(text: &str) -> Vec<String> {
    let mut questions = Vec::new();
    let mut sentence_start = 0;

    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?' | '\n') {
            let sentence = text[sentence_start..i + c.len_utf8()].trim();
            if c == '?' && sentence.len() > 1 {
                questions.push(sentence.to_string());
            }
            sentence_start = i + c.len_utf8();
        }
    }

    questions
}
