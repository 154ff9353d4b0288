//! Anthropic Messages API provider.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Extended thinking, with signed thinking blocks replayed on later calls

use async_trait::async_trait;
use pitchside_config::AppConfig;
use pitchside_core::error::ProviderError;
use pitchside_core::provider::*;
use pitchside_core::transcript::{ContentItem, Role, ToolCallRequest, ToolOutcome, Turn};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const HEALTH_CHECK_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        // Reasoning calls can take minutes.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Build from application config. Fails when no API key is available.
    pub fn from_config(config: &AppConfig) -> std::result::Result<Self, ProviderError> {
        let key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured(
                "no API key; set ANTHROPIC_API_KEY or api_key in ~/.pitchside/config.toml".into(),
            )
        })?;
        Ok(Self::new(key).with_base_url(&config.api_url))
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert transcript turns to API messages.
    ///
    /// Consecutive turns from the same side are merged into one message, so a
    /// run of tool-result turns goes out as a single user message.
    fn to_api_messages(turns: &[Turn]) -> Vec<AnthropicMessage> {
        let mut result: Vec<AnthropicMessage> = Vec::new();

        for turn in turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            let blocks: Vec<ContentBlock> = turn.content.iter().filter_map(Self::to_block).collect();
            if blocks.is_empty() {
                continue;
            }

            match result.last_mut() {
                Some(prev) if prev.role == role => prev.content.extend(blocks),
                _ => result.push(AnthropicMessage {
                    role: role.into(),
                    content: blocks,
                }),
            }
        }

        // Tool results must lead their user message; the sort is stable.
        for message in &mut result {
            message
                .content
                .sort_by_key(|block| !matches!(block, ContentBlock::ToolResult { .. }));
        }

        result
    }

    fn to_block(item: &ContentItem) -> Option<ContentBlock> {
        match item {
            // The API rejects empty text blocks.
            ContentItem::Text { text } if text.is_empty() => None,
            ContentItem::Text { text } => Some(ContentBlock::Text { text: text.clone() }),
            // Unsigned thinking cannot be replayed.
            ContentItem::Reasoning { signature: None, .. } => None,
            ContentItem::Reasoning {
                thinking,
                signature: Some(signature),
            } => Some(ContentBlock::Thinking {
                thinking: thinking.clone(),
                signature: signature.clone(),
            }),
            ContentItem::ToolCall(call) => Some(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            }),
            ContentItem::ToolResult {
                tool_call_id,
                outcome,
            } => Some(ContentBlock::ToolResult {
                tool_use_id: tool_call_id.clone(),
                content: outcome.text().to_string(),
                is_error: matches!(outcome, ToolOutcome::Error(_)).then_some(true),
            }),
        }
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    /// Build the JSON request body.
    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.turns),
            "max_tokens": request.max_tokens,
        });

        if !request.system.is_empty() {
            body["system"] = serde_json::json!(request.system);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        match request.thinking_budget {
            // Temperature must stay at its default while thinking is on.
            Some(budget) => {
                body["thinking"] = serde_json::json!({
                    "type": "enabled",
                    "budget_tokens": budget
                });
            }
            None => {
                if let Some(temperature) = request.temperature {
                    body["temperature"] = serde_json::json!(temperature);
                }
            }
        }

        body
    }

    /// Convert Anthropic API response to our ProviderResponse.
    fn response_to_provider_response(resp: AnthropicResponse) -> ProviderResponse {
        let content = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(ResponseBlock::Text { text }),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    Some(ResponseBlock::ToolCall(ToolCallRequest { id, name, input }))
                }
                ResponseContentBlock::Thinking { thinking, signature } => {
                    Some(ResponseBlock::Reasoning { thinking, signature })
                }
                ResponseContentBlock::Other => None,
            })
            .collect();

        ProviderResponse {
            id: resp.id,
            model: resp.model,
            content,
            usage: Some(Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            }),
            stop_reason: resp.stop_reason,
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            thinking = request.thinking_budget.is_some(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        // 529 is Anthropic's "overloaded"; it is handled like a rate limit.
        if status == 429 || status == 529 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(status, retry_after_secs, "Anthropic rate limit");
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}")))?;

        Ok(Self::response_to_provider_response(api_resp))
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        // Minimal request to verify the API key
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": HEALTH_CHECK_MODEL,
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 1,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        Ok(status != 401 && status != 403)
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "thinking")]
    Thinking { thinking: String, signature: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "thinking")]
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
