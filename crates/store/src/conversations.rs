//! Saved conversations, one JSON file per transcript.
//!
//! Storage location: `~/.pitchside/conversations/<id>.json`

use chrono::{DateTime, Utc};
use pitchside_core::error::StoreError;
use pitchside_core::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

const TITLE_CHARS: usize = 40;
const DEFAULT_TITLE: &str = "New Conversation";

/// A persisted transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub title: String,
    pub transcript: Transcript,
    pub last_updated: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn from_transcript(transcript: Transcript) -> Self {
        Self {
            id: transcript.id.0.clone(),
            title: title_for(&transcript),
            last_updated: transcript.updated_at,
            transcript,
        }
    }
}

/// Listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub turns: usize,
    pub last_updated: DateTime<Utc>,
}

/// First line of the first user message, cut to 40 characters.
pub fn title_for(transcript: &Transcript) -> String {
    let Some(text) = transcript.first_user_text() else {
        return DEFAULT_TITLE.to_string();
    };
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first_line.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if first_line.chars().count() > TITLE_CHARS {
        let cut: String = first_line.chars().take(TITLE_CHARS).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !valid_id(id) {
            return Err(StoreError::Invalid(format!("invalid conversation id '{id}'")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    /// Write the transcript, replacing any earlier save of the same id.
    pub async fn save(&self, transcript: &Transcript) -> Result<ConversationRecord, StoreError> {
        let record = ConversationRecord::from_transcript(transcript.clone());
        let path = self.path_for(&record.id)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::Invalid(format!("serialize conversation: {e}")))?;
        tokio::fs::write(&path, json).await?;

        debug!(id = %record.id, turns = transcript.len(), "Conversation saved");
        Ok(record)
    }

    pub async fn load(&self, id: &str) -> Result<ConversationRecord, StoreError> {
        let path = self.path_for(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("conversation '{id}'")));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| StoreError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Saved conversations, newest first. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| e.to_string())
                .and_then(|c| {
                    serde_json::from_str::<ConversationRecord>(&c).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(record) => summaries.push(ConversationSummary {
                    id: record.id,
                    title: record.title,
                    turns: record.transcript.len(),
                    last_updated: record.last_updated,
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable conversation"),
            }
        }

        summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(summaries)
    }
}
