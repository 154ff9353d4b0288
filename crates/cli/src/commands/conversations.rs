//! `pitchside conversations` — saved sessions, newest first.

use super::{CliResult, conversations, load_config};
use std::path::PathBuf;

pub async fn run(data: Option<PathBuf>) -> CliResult {
    let config = load_config(data)?;
    let saved = conversations(&config).list().await?;

    if saved.is_empty() {
        println!("No saved conversations in {}", config.data.conversations_dir.display());
        return Ok(());
    }

    println!("💬 Saved conversations");
    println!("======================");
    for summary in saved {
        println!(
            "  {}  {}  {:>3} turns  {}",
            summary.last_updated.format("%Y-%m-%d %H:%M"),
            summary.id,
            summary.turns,
            summary.title
        );
    }
    println!();
    println!("  Resume with: pitchside chat --resume <id>");
    Ok(())
}
