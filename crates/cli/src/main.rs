//! Pitchside CLI — the main entry point.
//!
//! Commands:
//! - `query`         — Ask one question and print the answer
//! - `chat`          — Interactive session, saved after every answer
//! - `team`          — Export one team's matches to a JSON-lines file
//! - `compact`       — Print a compact rendering of the whole dataset
//! - `report`        — Team record, opponents and worthy adversaries
//! - `groups`        — Manage named team groups
//! - `conversations` — List saved conversations
//! - `doctor`        — Diagnose setup problems

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "pitchside",
    about = "Pitchside — ask questions about your soccer match data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Match dataset (JSON lines or a JSON array); overrides the config
    #[arg(long, global = true, env = "PITCHSIDE_DATA_FILE")]
    data: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Query {
        /// The question, e.g. "How did Key West FC do in March 2025?"
        question: String,

        /// Override the maximum tokens per response
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Override the reasoning budget (0 disables reasoning)
        #[arg(long)]
        thinking_budget: Option<u32>,

        /// Save the conversation so `chat --resume` can continue it
        #[arg(long)]
        save: bool,
    },

    /// Chat interactively about the data
    Chat {
        /// Continue a saved conversation
        #[arg(long)]
        resume: Option<String>,
    },

    /// Export every match of one team (or team group)
    Team {
        name: String,

        /// Output file (defaults to <team>.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the dataset in a compact form
    Compact {
        /// compact, table or csv
        #[arg(short, long, default_value = "compact")]
        format: String,
    },

    /// Team performance report
    Report {
        team: String,

        /// last_30_days, last_90_days, this_year, last_year, all_time or year_YYYY
        #[arg(short, long, default_value = "this_year")]
        preset: String,

        /// Minimum competitiveness score (0-100) for worthy opponents
        #[arg(short, long, default_value_t = 30.0)]
        threshold: f64,
    },

    /// Manage team groups
    Groups {
        #[command(subcommand)]
        action: GroupsAction,
    },

    /// List saved conversations
    Conversations,

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
pub enum GroupsAction {
    /// List all groups
    List,

    /// Create a group
    Create {
        name: String,
        #[arg(required = true)]
        teams: Vec<String>,
    },

    /// Replace a group's members
    Update {
        name: String,
        #[arg(required = true)]
        teams: Vec<String>,
    },

    /// Delete a group
    Delete { name: String },

    /// Import groups from a JSON file ({"group": ["team", ...]})
    Import { file: PathBuf },

    /// Export all groups as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let data = cli.data;
    match cli.command {
        Commands::Query {
            question,
            max_tokens,
            thinking_budget,
            save,
        } => commands::query::run(data, &question, max_tokens, thinking_budget, save).await?,
        Commands::Chat { resume } => commands::chat::run(data, resume).await?,
        Commands::Team { name, output } => commands::team::run(data, &name, output).await?,
        Commands::Compact { format } => commands::compact::run(data, &format).await?,
        Commands::Report {
            team,
            preset,
            threshold,
        } => commands::report::run(data, &team, &preset, threshold).await?,
        Commands::Groups { action } => commands::groups::run(data, action).await?,
        Commands::Conversations => commands::conversations::run(data).await?,
        Commands::Doctor => commands::doctor::run(data).await?,
    }

    Ok(())
}
