//! Language-model collaborator used by the orchestrator.

use std::future::Future;

/// Title used whenever the model cannot produce one.
pub const DEFAULT_TITLE: &str = "Meeting";

/// Produces a short calendar title from a message body.
///
/// Implementations never fail from the caller's point of view; on any error
/// they return [`DEFAULT_TITLE`].
pub trait TitleGenerator: Send + Sync {
    fn generate_title(&self, body: &str) -> impl Future<Output = String> + Send;
}

/// First non-empty line of a model answer, or [`DEFAULT_TITLE`].
pub fn title_from_answer(answer: Option<&str>) -> String {
    answer
        .and_then(|a| a.trim().lines().next())
        .map(|line| line.trim().trim_matches(|c| c == '*' || c == '"').trim())
        .filter(|line| !line.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}
