mod commands;
mod config;
mod notify;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mailcal")]
#[command(about = "Turn meeting requests in your inbox into calendar events")]
struct Cli {
    /// Config file (defaults to ~/.config/mailcal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store unread messages from Gmail
    Fetch,
    /// Create calendar events for stored meeting requests
    Schedule,
    /// Fetch, then schedule
    Run,
    /// Show what date/time would be extracted from TEXT
    Extract {
        text: String,

        /// Reference time for relative expressions (RFC 3339, defaults to now)
        #[arg(short, long)]
        reference: Option<String>,
    },
    /// Summarize a stored message and draft a reply
    Summarize {
        /// Message id (defaults to the most recent message)
        #[arg(long)]
        id: Option<String>,
    },
    /// Send drafted replies to unanswered human senders
    Reply {
        /// Print the drafts without sending anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "mailcal=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch => commands::fetch::run(&config).await,
        Commands::Schedule => commands::schedule::run(&config).await,
        Commands::Run => {
            // Fail on missing credentials before touching the inbox
            config.gemini_api_key()?;
            commands::fetch::run(&config).await?;
            commands::schedule::run(&config).await
        }
        Commands::Extract { text, reference } => {
            commands::extract::run(&config, &text, reference.as_deref())
        }
        Commands::Summarize { id } => commands::summarize::run(&config, id.as_deref()).await,
        Commands::Reply { dry_run } => commands::reply::run(&config, dry_run).await,
    }
}
