//! `pitchside doctor` — diagnose setup problems.

use pitchside_config::AppConfig;
use pitchside_core::provider::Provider;
use pitchside_providers::AnthropicProvider;
use pitchside_store::{MatchStore, TeamGroupStore};
use std::path::PathBuf;

use super::CliResult;

pub async fn run(data: Option<PathBuf>) -> CliResult {
    println!("🩺 Pitchside Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    // Config
    let config_path = AppConfig::config_dir().join("config.toml");
    let mut config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid ({})", config_path.display());
            } else {
                println!("  ℹ️  No config file at {}, using defaults", config_path.display());
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            issues += 1;
            AppConfig::default()
        }
    };
    if let Some(path) = data {
        config.data.dataset_path = path;
    }

    // API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set ANTHROPIC_API_KEY or api_key in config.toml");
        issues += 1;
    }

    // Dataset
    match MatchStore::open(&config.data.dataset_path).await {
        Ok(store) => {
            let rows = store.row_count().await.unwrap_or(0);
            match store.date_range().await {
                Ok(Some((earliest, latest))) => println!(
                    "  ✅ Dataset loaded: {rows} matches, {earliest} to {latest}"
                ),
                _ => {
                    println!("  ⚠️  Dataset {} is empty", config.data.dataset_path.display());
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Dataset: {e}");
            issues += 1;
        }
    }

    // Team groups
    match TeamGroupStore::open(&config.data.groups_db).await {
        Ok(groups) => match groups.list().await {
            Ok(all) => println!("  ✅ Team group store ok ({} groups)", all.len()),
            Err(e) => {
                println!("  ❌ Team group store unreadable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Team group store: {e}");
            issues += 1;
        }
    }

    // Provider reachability
    if config.has_api_key() {
        match AnthropicProvider::from_config(&config) {
            Ok(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Anthropic API reachable, key accepted"),
                Ok(false) => {
                    println!("  ❌ Anthropic API rejected the key");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Anthropic API unreachable: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Provider: {e}");
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
