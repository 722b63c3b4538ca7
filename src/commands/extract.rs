use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use mailcal_core::extract::{extract_meeting_datetime, search_dates};
use mailcal_core::schedule::normalize;

use crate::config::Config;

/// Offline dry run of the extractor; touches no provider.
pub fn run(config: &Config, text: &str, reference: Option<&str>) -> Result<()> {
    let scheduling = config.scheduler_config()?;
    let reference = match reference {
        Some(raw) => parse_reference(raw)?,
        None => Utc::now().with_timezone(&scheduling.timezone).naive_local(),
    };

    println!("Reference: {}", reference.format("%Y-%m-%d %H:%M (%A)"));

    let spans = search_dates(text, reference);
    if spans.is_empty() {
        println!("No date expressions found.");
    }
    for span in &spans {
        match span.instant {
            Some(instant) => println!("  \"{}\" → {}", span.text, instant),
            None => println!("  \"{}\" → (not a valid date)", span.text),
        }
    }

    match extract_meeting_datetime(text, reference) {
        Some(instant) => {
            let start = normalize(&instant, &scheduling)?;
            println!("\nExtracted: {}", instant);
            println!(
                "Event:     {} to {} ({})",
                start.to_rfc3339(),
                (start + scheduling.meeting_duration).to_rfc3339(),
                scheduling.timezone.name()
            );
        }
        None => println!("\nNothing to schedule."),
    }

    Ok(())
}

fn parse_reference(raw: &str) -> Result<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .with_context(|| format!("Invalid --reference '{}', expected RFC 3339", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_keeps_wall_clock() {
        let reference = parse_reference("2026-03-02T09:30:00+05:30").unwrap();
        assert_eq!(reference.to_string(), "2026-03-02 09:30:00");
        assert!(parse_reference("monday").is_err());
    }
}
