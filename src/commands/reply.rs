use anyhow::Result;
use mailcal_core::classify::is_human_sender;
use tracing::warn;

use crate::config::Config;

/// Reply to every unanswered message from a human sender.
///
/// A failed send is logged and the message stays unanswered for next time.
pub async fn run(config: &Config, dry_run: bool) -> Result<()> {
    let gmail = super::gmail(config)?;
    let gemini = super::gemini(config)?;
    let mut store = super::open_store(config)?;

    let candidates: Vec<_> = store
        .unreplied()
        .into_iter()
        .map(|stored| stored.message.clone())
        .collect();

    let mut sent = 0;
    for message in candidates {
        if !is_human_sender(&message.sender) {
            println!("  Ignored automated sender: {}", message.sender);
            continue;
        }

        let Some(reply) = gemini.generate_reply(&message.body).await else {
            println!("  No reply for: {}", message.subject);
            continue;
        };

        let subject = reply_subject(&message.subject);
        if dry_run {
            println!("\nTo: {}\nSubject: {}\n\n{}\n", message.sender, subject, reply);
            continue;
        }

        if let Err(e) = gmail.send(&message.sender, &subject, &reply).await {
            warn!(id = %message.id, error = %e, "Reply not sent");
            continue;
        }
        if let Err(e) = gmail.mark_read(&message.id).await {
            warn!(id = %message.id, error = %e, "Could not mark as read");
        }

        store.mark_replied(&message.id)?;
        store.save()?;
        println!("  Replied to {}: {}", message.sender, message.subject);
        sent += 1;
    }

    if !dry_run {
        println!("Sent {} repl{}.", sent, if sent == 1 { "y" } else { "ies" });
    }

    Ok(())
}

fn reply_subject(subject: &str) -> String {
    if subject.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:")) {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    }
}
