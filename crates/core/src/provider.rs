//! Provider trait — the Model Gateway abstraction.
//!
//! A Provider turns a transcript, a system instruction and the tool
//! definitions into one call against a hosted completion service, and hands
//! back the response content in emission order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::transcript::{ContentItem, ToolCallRequest, Turn};

/// One request to the Model Gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-3-7-sonnet-20250219")
    pub model: String,

    /// Static system instruction
    #[serde(default)]
    pub system: String,

    /// Full transcript, oldest turn first
    pub turns: Vec<Turn>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Reasoning budget; `None` disables the reasoning trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,

    /// Sampling temperature. Ignored by the gateway while reasoning is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderRequest {
    /// A one-shot prompt with no tools and no reasoning budget.
    pub fn prompt(
        model: impl Into<String>,
        system: impl Into<String>,
        prompt: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            turns: vec![Turn::user(prompt)],
            tools: Vec::new(),
            max_tokens,
            thinking_budget: None,
            temperature: None,
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's input, passed through verbatim
    pub input_schema: serde_json::Value,
}

/// One content block of a gateway response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    Reasoning {
        thinking: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    ToolCall(ToolCallRequest),
}

impl From<ResponseBlock> for ContentItem {
    fn from(block: ResponseBlock) -> Self {
        match block {
            ResponseBlock::Text { text } => ContentItem::Text { text },
            ResponseBlock::Reasoning { thinking, signature } => {
                ContentItem::Reasoning { thinking, signature }
            }
            ResponseBlock::ToolCall(call) => ContentItem::ToolCall(call),
        }
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Provider-assigned response id
    pub id: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Content blocks in emission order
    pub content: Vec<ResponseBlock>,

    /// Token usage statistics
    pub usage: Option<Usage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl ProviderResponse {
    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ResponseBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_calls(&self) -> Vec<&ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ResponseBlock::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self) -> bool {
        !self.text().trim().is_empty()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// The Model Gateway.
///
/// The agent loop calls `complete()` without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check — can we reach the provider with these credentials?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
