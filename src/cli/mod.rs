use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use newsletter_optimizer::Config;

pub mod commands;
pub mod migrate;

#[derive(Parser)]
#[command(
    name = "newsletter",
    about = "Daily futures newsletter cleanup and level extraction",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process an exported newsletter email and store the results
    Process {
        /// JSON export with subject, date and html/text body
        #[arg(short, long)]
        file: PathBuf,

        /// Reference instant (RFC 3339), defaults to now
        #[arg(short, long)]
        at: Option<DateTime<Utc>>,
    },

    /// Extract sections and levels without touching the database
    Optimize {
        /// JSON export with subject, date and html/text body
        #[arg(short, long)]
        file: PathBuf,

        /// Weekday of the trade plan header, overrides the resolved session
        #[arg(short, long)]
        weekday: Option<String>,

        /// Reference instant (RFC 3339), defaults to now
        #[arg(short, long)]
        at: Option<DateTime<Utc>>,
    },

    /// Show the trading session a reference instant resolves to
    Session {
        /// Reference instant (RFC 3339), defaults to now
        #[arg(short, long)]
        at: Option<DateTime<Utc>>,
    },

    /// Print the stored optimized record for a session
    Show {
        /// Newsletter id (YYYYMMDD)
        #[arg(short, long)]
        id: String,
    },

    /// Run database migrations
    Migrate,
}

/// Execute CLI command
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Process { file, at } => {
            info!("Processing newsletter export {}", file.display());
            commands::process(&config, file, at).await?;
        }
        Commands::Optimize { file, weekday, at } => {
            info!("Optimizing newsletter export {}", file.display());
            commands::optimize(&config, file, weekday, at).await?;
        }
        Commands::Session { at } => {
            commands::session(&config, at)?;
        }
        Commands::Show { id } => {
            info!("Looking up optimized newsletter {}", id);
            commands::show(&config, id).await?;
        }
        Commands::Migrate => {
            migrate::execute(&config).await?;
        }
    }
    Ok(())
}
