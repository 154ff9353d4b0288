//! Transcript domain types.
//!
//! A [`Transcript`] is the ordered turn history that is replayed to the model
//! on every call. It is append-only: turns are pushed, never edited or removed.
//! Tool results travel as user-origin turns keyed by the originating call id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a transcript (one logical session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptId(pub String);

impl TranscriptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for TranscriptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the exchange produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user, or a tool result fed back on the user's side
    User,
    /// The model
    Assistant,
}

/// A model's request to run one tool. Consumed exactly once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call id assigned by the model; the matching result carries it back
    pub id: String,

    /// Registered tool name
    pub name: String,

    /// Named arguments, passed to the tool untouched
    pub input: serde_json::Value,
}

/// What a tool invocation produced.
///
/// Serialises as `{"result": "..."}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOutcome {
    #[serde(rename = "result")]
    Success(String),
    #[serde(rename = "error")]
    Error(String),
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The payload text, whichever kind it is.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(s) | Self::Error(s) => s,
        }
    }
}

/// One item inside a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text {
        text: String,
    },
    /// A reasoning trace. The signature must be replayed verbatim.
    Reasoning {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    ToolCall(ToolCallRequest),
    ToolResult {
        tool_call_id: String,
        outcome: ToolOutcome,
    },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single turn: one actor, one or more content items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentItem>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// A plain user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentItem::text(text)],
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn built from the model's content items.
    pub fn assistant(content: Vec<ContentItem>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
        }
    }

    /// A user-origin turn carrying one tool result.
    pub fn tool_result(tool_call_id: impl Into<String>, outcome: ToolOutcome) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentItem::ToolResult {
                tool_call_id: tool_call_id.into(),
                outcome,
            }],
            timestamp: Utc::now(),
        }
    }

    /// All text items joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallRequest> {
        self.content.iter().filter_map(|item| match item {
            ContentItem::ToolCall(call) => Some(call),
            _ => None,
        })
    }

    /// True when this turn only carries tool results.
    pub fn is_tool_result(&self) -> bool {
        !self.content.is_empty()
            && self
                .content
                .iter()
                .all(|item| matches!(item, ContentItem::ToolResult { .. }))
    }
}

/// The ordered, append-only history of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: TranscriptId,

    turns: Vec<Turn>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: TranscriptId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a transcript seeded with one user question.
    pub fn with_question(question: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Turn::user(question));
        transcript
    }

    /// Append a turn. This is the only way to change the history.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Text of the first plain user message, if any.
    pub fn first_user_text(&self) -> Option<String> {
        self.turns
            .iter()
            .filter(|t| t.role == Role::User && !t.is_tool_result())
            .map(Turn::text)
            .find(|text| !text.trim().is_empty())
    }

    /// The most recent non-empty assistant text.
    pub fn last_assistant_text(&self) -> Option<String> {
        self.turns
            .iter()
            .rev()
            .filter(|t| t.role == Role::Assistant)
            .map(Turn::text)
            .find(|text| !text.trim().is_empty())
    }

    /// Call ids that have been requested but not yet answered.
    pub fn unanswered_calls(&self) -> Vec<String> {
        let mut pending: Vec<String> = Vec::new();
        for turn in &self.turns {
            for item in &turn.content {
                match item {
                    ContentItem::ToolCall(call) => pending.push(call.id.clone()),
                    ContentItem::ToolResult { tool_call_id, .. } => {
                        pending.retain(|id| id != tool_call_id)
                    }
                    _ => {}
                }
            }
        }
        pending
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
