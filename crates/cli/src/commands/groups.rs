//! `pitchside groups` — named team groups.

use super::{CliResult, load_config, open_groups};
use crate::GroupsAction;
use std::path::PathBuf;

pub async fn run(data: Option<PathBuf>, action: GroupsAction) -> CliResult {
    let config = load_config(data)?;
    let groups = open_groups(&config).await?;

    match action {
        GroupsAction::List => {
            let all = groups.list().await?;
            if all.is_empty() {
                println!("No team groups yet. Create one with: pitchside groups create <name> <team>...");
            }
            for group in all {
                println!("{} ({} teams)", group.name, group.teams.len());
                for team in &group.teams {
                    println!("  - {team}");
                }
            }
        }
        GroupsAction::Create { name, teams } => {
            let group = groups.create(&name, &teams).await?;
            println!("✅ Created group '{}' with {} teams", group.name, group.teams.len());
        }
        GroupsAction::Update { name, teams } => {
            let group = groups.update(&name, &teams).await?;
            println!("✅ Updated group '{}' ({} teams)", group.name, group.teams.len());
        }
        GroupsAction::Delete { name } => {
            groups.delete(&name).await?;
            println!("🗑️  Deleted group '{name}'");
        }
        GroupsAction::Import { file } => {
            let json = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
            let count = groups.import_json(&json).await?;
            println!("📥 Imported {count} groups from {}", file.display());
        }
        GroupsAction::Export { output } => {
            let json = groups.export_json().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &json).await?;
                    println!("📤 Exported groups to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
