//! `pitchside team` — export one team's matches.

use super::{CliResult, load_config, open_groups, open_matches, team_filter};
use std::path::PathBuf;

/// "Key West FC (1)" -> "key_west_fc_1.jsonl"
fn default_output(team: &str) -> PathBuf {
    let slug: String = team
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let slug = if slug.is_empty() { "team".to_string() } else { slug };
    PathBuf::from(format!("{slug}.jsonl"))
}

pub async fn run(data: Option<PathBuf>, name: &str, output: Option<PathBuf>) -> CliResult {
    let config = load_config(data)?;
    let store = open_matches(&config).await?;
    let groups = open_groups(&config).await?;

    let filter = team_filter(&groups, name).await?;
    let output = output.unwrap_or_else(|| default_output(name));
    let written = store.export_jsonl(&filter, &output).await?;

    println!("📤 Wrote {written} matches for '{filter}' to {}", output.display());
    Ok(())
}
