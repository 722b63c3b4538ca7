pub mod extract;
pub mod fetch;
pub mod reply;
pub mod schedule;
pub mod summarize;

use anyhow::{Context, Result};
use mailcal_core::MessageStore;
use mailcal_provider_google::{GeminiClient, GmailClient, GoogleCalendar};

use crate::config::Config;
use crate::notify::AnyNotifier;

pub fn open_store(config: &Config) -> Result<MessageStore> {
    let path = config.store_path()?;
    MessageStore::load(&path)
        .with_context(|| format!("Failed to open message store at {}", path.display()))
}

pub fn notifier(config: &Config) -> Result<AnyNotifier> {
    Ok(match AnyNotifier::from_credentials(config.slack_credentials()?) {
        AnyNotifier::Slack(slack) => {
            AnyNotifier::Slack(slack.with_timeout(config.provider_timeout()?))
        }
        log => log,
    })
}

pub fn gmail(config: &Config) -> Result<GmailClient> {
    Ok(GmailClient::new(config.google_token()?).with_timeout(config.provider_timeout()?))
}

pub fn calendar(config: &Config) -> Result<GoogleCalendar> {
    Ok(GoogleCalendar::new(config.google_token()?).with_timeout(config.provider_timeout()?))
}

pub fn gemini(config: &Config) -> Result<GeminiClient> {
    Ok(GeminiClient::new(config.gemini_api_key()?)
        .with_model(&config.gemini.model)
        .with_temperature(config.gemini.temperature)
        .with_timeout(config.provider_timeout()?))
}
