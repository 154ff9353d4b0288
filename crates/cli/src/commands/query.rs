//! `pitchside query` — one question, one answer.

use super::{CliResult, analyst, answer_text, conversations, incomplete_note, load_config, opening_turn};
use std::path::PathBuf;

pub async fn run(
    data: Option<PathBuf>,
    question: &str,
    max_tokens: Option<u32>,
    thinking_budget: Option<u32>,
    save: bool,
) -> CliResult {
    let mut config = load_config(data)?;
    if let Some(max_tokens) = max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(budget) = thinking_budget {
        config.thinking_budget = budget;
    }
    config.validate()?;

    let (agent, store) = analyst(&config).await?;
    let mut transcript = opening_turn(question, &store, &config).await?;

    eprint!("  Thinking...");
    let result = agent.run(&mut transcript).await;
    eprint!("\r              \r");

    // Saved even when the run failed: the turns so far can be resumed.
    if save {
        let record = conversations(&config).save(&transcript).await?;
        eprintln!("  Saved conversation {} ({})", record.id, record.title);
    }

    let outcome = result?;
    println!("{}", answer_text(&outcome));
    if let Some(note) = incomplete_note(&outcome) {
        eprintln!("  {note}");
    }
    tracing::debug!(
        round_trips = outcome.round_trips,
        tool_calls = outcome.tool_calls,
        termination = ?outcome.termination,
        "Query finished"
    );
    Ok(())
}
