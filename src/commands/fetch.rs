use anyhow::Result;
use mailcal_core::notify::Notifier;

use crate::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    let gmail = super::gmail(config)?;
    let notifier = super::notifier(config)?;
    let mut store = super::open_store(config)?;

    let messages = gmail.list_unread(config.mail.max_emails).await?;
    let unread = messages.len();
    let mut stored = 0;

    for message in messages {
        let text = format!(
            "📬 *New Email Received!*\n*Subject:* {}\n*From:* {}",
            message.subject, message.sender
        );
        let subject = message.subject.clone();

        if store.insert_if_new(message) {
            println!("  Stored: {}", subject);
            notifier.notify(&text).await;
            stored += 1;
        }
    }

    store.save()?;
    println!("Fetched {} unread, {} new.", unread, stored);

    Ok(())
}
