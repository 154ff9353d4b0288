//! Subcommands and the setup they share.

pub mod chat;
pub mod compact;
pub mod conversations;
pub mod doctor;
pub mod groups;
pub mod query;
pub mod report;
pub mod team;

use chrono::Local;
use pitchside_agent::{AgentLoop, AgentOutcome, Termination, opening_message};
use pitchside_config::AppConfig;
use pitchside_core::provider::Provider;
use pitchside_core::transcript::Transcript;
use pitchside_providers::{AnthropicProvider, RetryPolicy, RetryingProvider};
use pitchside_store::{ConversationStore, MatchStore, TeamFilter, TeamGroupStore};
use std::path::PathBuf;
use std::sync::Arc;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Load config and apply the `--data` override.
pub fn load_config(data: Option<PathBuf>) -> CliResult<AppConfig> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(path) = data {
        config.data.dataset_path = path;
    }
    Ok(config)
}

pub async fn open_matches(config: &AppConfig) -> CliResult<Arc<MatchStore>> {
    let store = MatchStore::open(&config.data.dataset_path).await.map_err(|e| {
        format!("{e}\n  Point --data (or PITCHSIDE_DATA_FILE) at a JSON-lines match file.")
    })?;
    Ok(Arc::new(store.with_max_rows(config.data.max_result_rows)))
}

pub async fn open_groups(config: &AppConfig) -> CliResult<Arc<TeamGroupStore>> {
    Ok(Arc::new(TeamGroupStore::open(&config.data.groups_db).await?))
}

pub fn conversations(config: &AppConfig) -> ConversationStore {
    ConversationStore::new(&config.data.conversations_dir)
}

/// A saved group of that name, otherwise a substring match.
pub async fn team_filter(groups: &TeamGroupStore, name: &str) -> CliResult<TeamFilter> {
    Ok(match groups.get(name).await? {
        Some(group) if !group.teams.is_empty() => TeamFilter::Exact(group.teams),
        _ => TeamFilter::Contains(name.to_string()),
    })
}

/// The agent wired to the real data tools.
pub async fn analyst(config: &AppConfig) -> CliResult<(AgentLoop, Arc<MatchStore>)> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set ANTHROPIC_API_KEY, or add api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let store = open_matches(config).await?;
    let groups = open_groups(config).await?;
    let provider: Arc<dyn Provider> = Arc::new(AnthropicProvider::from_config(config)?);

    // Nested tool prompts back off on rate limits too; the loop wraps its own.
    let tool_provider: Arc<dyn Provider> = Arc::new(RetryingProvider::new(
        provider.clone(),
        RetryPolicy::from_settings(&config.retry),
    ));
    let registry = pitchside_tools::default_registry(store.clone(), groups, tool_provider, &config.model);

    let agent = AgentLoop::builder(provider, Arc::new(registry))
        .configure(config)
        .build();
    Ok((agent, store))
}

/// A fresh transcript whose first turn carries the question plus context.
pub async fn opening_turn(question: &str, store: &MatchStore, config: &AppConfig) -> CliResult<Transcript> {
    let schema = store.schema().await?;
    let message = opening_message(
        question,
        Local::now().date_naive(),
        &config.data.dataset_path.display().to_string(),
        &schema,
    );
    Ok(Transcript::with_question(message))
}

/// The text to show for an outcome: the completion summary when the task
/// was completed, otherwise the model's last text.
pub fn answer_text(outcome: &AgentOutcome) -> &str {
    match (&outcome.termination, outcome.summary.as_deref()) {
        (Termination::Completed, Some(summary)) if !summary.trim().is_empty() => summary,
        _ => &outcome.text,
    }
}

/// Footnote for answers cut short by the iteration budget.
pub fn incomplete_note(outcome: &AgentOutcome) -> Option<String> {
    if outcome.is_incomplete() {
        Some(format!(
            "No answer: the iteration budget ran out after {} round trips.",
            outcome.round_trips
        ))
    } else if outcome.termination == Termination::BudgetExhausted {
        Some("Answer may be incomplete: the iteration budget ran out.".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(termination: Termination, text: &str, summary: Option<&str>) -> AgentOutcome {
        AgentOutcome {
            text: text.into(),
            termination,
            round_trips: 3,
            tool_calls: 2,
            summary: summary.map(str::to_string),
        }
    }

    #[test]
    fn completed_outcome_shows_summary() {
        let o = outcome(Termination::Completed, "Checking.", Some("Key West won 3 of 4."));
        assert_eq!(answer_text(&o), "Key West won 3 of 4.");
        let o = outcome(Termination::Completed, "Won 3.", Some(" "));
        assert_eq!(answer_text(&o), "Won 3.");
        let o = outcome(Termination::Answered, "Won 3.", None);
        assert_eq!(answer_text(&o), "Won 3.");
    }

    #[test]
    fn budget_notes() {
        let o = outcome(Termination::BudgetExhausted, "", None);
        assert!(incomplete_note(&o).unwrap().contains("after 3 round trips"));
        let o = outcome(Termination::BudgetExhausted, "partial", None);
        assert!(incomplete_note(&o).unwrap().contains("may be incomplete"));
        let o = outcome(Termination::Answered, "done", None);
        assert!(incomplete_note(&o).is_none());
    }
}
