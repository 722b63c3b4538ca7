use anyhow::Result;
use mailcal_core::classify::extract_questions;
use mailcal_core::notify::Notifier;

use crate::config::Config;

pub async fn run(config: &Config, id: Option<&str>) -> Result<()> {
    let gemini = super::gemini(config)?;
    let notifier = super::notifier(config)?;
    let store = super::open_store(config)?;

    let stored = match id {
        Some(id) => store
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("No stored message with id '{}'", id))?,
        None => store
            .latest()
            .ok_or_else(|| anyhow::anyhow!("No messages stored yet. Run `mailcal fetch` first."))?,
    };
    let message = &stored.message;

    println!("Subject: {}", message.subject);
    println!("From:    {}\n", message.sender);

    let summary = gemini.summarize_email(&message.body).await;
    println!("Summary:\n{}\n", summary);
    notifier
        .notify(&format!("🧠 *Summary of:* {}\n{}", message.subject, summary))
        .await;

    match gemini.generate_reply(&message.body).await {
        Some(reply) => println!("Draft reply:\n{}\n", reply),
        None => println!("No usable reply draft.\n"),
    }

    let questions = extract_questions(&message.body);
    if !questions.is_empty() {
        println!("Questions:");
        for question in questions {
            println!("  - {}", question);
        }
    }

    Ok(())
}
