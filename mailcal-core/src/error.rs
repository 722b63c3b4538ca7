//! Error types for mailcal.

use thiserror::Error;

/// Errors that can occur in mailcal operations.
#[derive(Error, Debug)]
pub enum MailcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    /// A provider error worth retrying (rate limits, 5xx, network trouble).
    #[error("Transient provider error: {0}")]
    ProviderTransient(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Malformed instant: {0}")]
    MalformedInstant(String),

    #[error("Message store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MailcalError {
    /// Whether a failed provider call may succeed if tried again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MailcalError::ProviderTransient(_) | MailcalError::ProviderTimeout(_)
        )
    }
}

/// Result type alias for mailcal operations.
pub type MailcalResult<T> = Result<T, MailcalError>;
