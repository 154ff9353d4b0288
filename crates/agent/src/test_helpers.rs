//! Shared test helpers for agent loop tests.

use async_trait::async_trait;
use pitchside_core::error::{ProviderError, ToolError};
use pitchside_core::provider::{Provider, ProviderRequest, ProviderResponse, ResponseBlock, Usage};
use pitchside_core::tool::Tool;
use pitchside_core::transcript::ToolCallRequest;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next entry in the queue and records
/// the request it was given. Panics if more calls are made than responses
/// provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();
        if index >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                index,
                responses.len()
            );
        }
        requests.push(request);
        responses[index].clone()
    }
}

fn response(content: Vec<ResponseBlock>) -> ProviderResponse {
    ProviderResponse {
        id: "msg_mock".into(),
        model: "mock-model".into(),
        content,
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
        stop_reason: Some("end_turn".into()),
    }
}

/// A response with only text.
pub fn text_response(text: &str) -> ProviderResponse {
    response(vec![ResponseBlock::Text { text: text.into() }])
}

/// A response with optional commentary followed by tool calls.
pub fn tool_response(text: &str, calls: Vec<ToolCallRequest>) -> ProviderResponse {
    let mut content = Vec::new();
    if !text.is_empty() {
        content.push(ResponseBlock::Text { text: text.into() });
    }
    content.extend(calls.into_iter().map(ResponseBlock::ToolCall));
    response(content)
}

/// A response with no content at all.
pub fn empty_response() -> ProviderResponse {
    response(vec![])
}

pub fn call(id: &str, name: &str, input: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.into(),
        name: name.into(),
        input,
    }
}

/// Echoes its `text` argument; fails when `fail` is true.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the input"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" },
                "fail": { "type": "boolean" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        if input["fail"].as_bool().unwrap_or(false) {
            return Err(ToolError::ExecutionFailed {
                tool_name: "echo".into(),
                reason: "no such table: missing_table".into(),
            });
        }
        Ok(input["text"].as_str().unwrap_or_default().to_string())
    }
}

/// Minimal completion tool.
pub struct DoneTool;

#[async_trait]
impl Tool for DoneTool {
    fn name(&self) -> &str {
        "complete_task"
    }

    fn description(&self) -> &str {
        "Complete the task and provide the final response"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "reasoning": { "type": "string" } },
            "required": ["reasoning"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        match input["reasoning"].as_str() {
            Some(r) if !r.trim().is_empty() => Ok("Task completed".into()),
            _ => Err(ToolError::ExecutionFailed {
                tool_name: "complete_task".into(),
                reason: "No reasoning provided for task completion.".into(),
            }),
        }
    }
}
