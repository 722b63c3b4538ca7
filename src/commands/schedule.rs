use anyhow::Result;
use chrono::Utc;
use mailcal_core::{EventScheduler, KeywordClassifier, Orchestrator};

use crate::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    let calendar = super::calendar(config)?;
    let scheduler = EventScheduler::new(calendar, config.scheduler_config()?);
    let orchestrator = Orchestrator::new(scheduler, super::gemini(config)?, super::notifier(config)?)
        .with_classifier(KeywordClassifier::from(&config.classifier));
    let mut store = super::open_store(config)?;

    let pending = store.pending().len();
    if pending == 0 {
        println!("No pending messages.");
        return Ok(());
    }

    println!("Processing {} pending message(s)...", pending);
    let report = orchestrator.process_batch(&mut store, Utc::now()).await?;

    println!(
        "{} scheduled, {} without a date, {} not meetings, {} failed",
        report.created, report.skipped_no_date, report.skipped_not_meeting, report.failed
    );
    if report.failed > 0 {
        println!("Messages that failed on a temporary provider error are retried on the next run.");
    }

    Ok(())
}
