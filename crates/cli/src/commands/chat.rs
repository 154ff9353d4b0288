//! `pitchside chat` — interactive session over stdin.

use super::{CliResult, analyst, answer_text, conversations, incomplete_note, load_config};
use async_trait::async_trait;
use chrono::Local;
use pitchside_agent::{AgentOutcome, InputSource, opening_message};
use pitchside_core::error::Error;
use pitchside_core::transcript::Transcript;
use pitchside_store::{ColumnInfo, ConversationStore};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// Reads questions from stdin and saves the transcript before each prompt.
struct Terminal {
    lines: Lines<BufReader<Stdin>>,
    conversations: ConversationStore,
    data_source: String,
    schema: Vec<ColumnInfo>,
}

impl Terminal {
    fn prompt() {
        print!("  You > ");
        let _ = std::io::stdout().flush();
    }
}

fn is_exit(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "exit" | "quit")
}

#[async_trait]
impl InputSource for Terminal {
    fn show(&mut self, outcome: &AgentOutcome) {
        println!();
        for line in answer_text(outcome).lines() {
            println!("  Assistant > {line}");
        }
        if let Some(note) = incomplete_note(outcome) {
            println!("  ({note})");
        }
        println!();
    }

    fn report_error(&mut self, err: &Error) {
        eprintln!("  [Error] {err}");
        println!();
    }

    async fn next_message(&mut self, transcript: &Transcript) -> Option<String> {
        if !transcript.is_empty() {
            if let Err(e) = self.conversations.save(transcript).await {
                warn!(error = %e, "Failed to save conversation");
            }
        }

        Self::prompt();
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    return None;
                }
            };
            if is_exit(&line) {
                return None;
            }
            if line.trim().is_empty() {
                Self::prompt();
                continue;
            }
            // The first question of a new conversation carries the context.
            if transcript.is_empty() {
                return Some(opening_message(
                    &line,
                    Local::now().date_naive(),
                    &self.data_source,
                    &self.schema,
                ));
            }
            return Some(line);
        }
    }
}

pub async fn run(data: Option<PathBuf>, resume: Option<String>) -> CliResult {
    let config = load_config(data)?;
    let (agent, store) = analyst(&config).await?;
    let store_of_conversations = conversations(&config);

    let mut transcript = match resume {
        Some(id) => {
            let record = store_of_conversations.load(&id).await?;
            println!("  Resuming \"{}\" ({} turns)", record.title, record.transcript.len());
            record.transcript
        }
        None => Transcript::new(),
    };

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Pitchside — Interactive Analyst       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", agent.model());
    println!("  Data:      {}", config.data.dataset_path.display());
    println!("  Matches:   {}", store.row_count().await?);
    println!("  Session:   {}", transcript.id);
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut terminal = Terminal {
        lines: BufReader::new(tokio::io::stdin()).lines(),
        conversations: store_of_conversations,
        data_source: config.data.dataset_path.display().to_string(),
        schema: store.schema().await?,
    };

    let outcome = agent.run_interactive(&mut transcript, &mut terminal).await?;
    if !transcript.is_empty() {
        terminal.conversations.save(&transcript).await?;
    }

    println!();
    println!(
        "  Goodbye! {} round trips, {} tool calls. Resume with: pitchside chat --resume {}",
        outcome.round_trips, outcome.tool_calls, transcript.id
    );
    println!();
    Ok(())
}
