//! The completion tool. Calling it ends the agent loop; its `reasoning`
//! argument is the final answer.

use crate::failed;
use async_trait::async_trait;
use pitchside_core::error::ToolError;
use pitchside_core::tool::Tool;
use tracing::info;

/// Name the agent loop watches for.
pub const COMPLETION_TOOL: &str = "complete_task";

pub struct CompleteTaskTool;

#[async_trait]
impl Tool for CompleteTaskTool {
    fn name(&self) -> &str {
        COMPLETION_TOOL
    }

    fn description(&self) -> &str {
        "Complete the task and provide the final response"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Final summary and answer to the user's question"
                }
            },
            "required": ["reasoning"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let reasoning = input["reasoning"].as_str().unwrap_or("").trim();
        if reasoning.is_empty() {
            return Err(failed(self.name(), "No reasoning provided for task completion."));
        }
        info!(chars = reasoning.len(), "Task completed");
        Ok("Task completed".into())
    }
}
