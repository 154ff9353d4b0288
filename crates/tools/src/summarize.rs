//! Summaries of query results through a nested model call.

use crate::{failed, required_str};
use async_trait::async_trait;
use pitchside_core::error::ToolError;
use pitchside_core::provider::{Provider, ProviderRequest};
use pitchside_core::tool::Tool;
use std::sync::Arc;

const MAX_TOKENS: u32 = 1000;

fn prompt_for(summarization_type: &str) -> &'static str {
    match summarization_type.to_lowercase().as_str() {
        "brief" => {
            "Provide a very concise summary of the key insights from this data. Focus only on the most important points and keep it to 2-3 sentences."
        }
        "detailed" => {
            "Provide a comprehensive analysis of this data, including key metrics, trends, and notable outliers. Format the information in a well-structured way with headings and bullet points where appropriate."
        }
        "comparative" => {
            "Compare and contrast the different entities or time periods in this data. Highlight significant differences and similarities."
        }
        "insights" => {
            "Extract 3-5 key actionable insights from this data that would be valuable for decision-making."
        }
        "narrative" => {
            "Create a narrative story that explains what this data shows in an engaging, conversational way that non-technical stakeholders would understand."
        }
        _ => "Summarize the following data in a clear, concise manner:",
    }
}

pub struct SummarizeResultsTool {
    provider: Arc<dyn Provider>,
    model: String,
}

impl SummarizeResultsTool {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Tool for SummarizeResultsTool {
    fn name(&self) -> &str {
        "summarize_results"
    }

    fn description(&self) -> &str {
        "Summarize query results through a prompt for better presentation"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Why summarization is needed and what aspects to focus on"
                },
                "data": {
                    "type": "string",
                    "description": "The data to be summarized (usually query results)"
                },
                "summarization_type": {
                    "type": "string",
                    "description": "Type of summarization needed (brief, detailed, comparative, insights, narrative)",
                    "enum": ["brief", "detailed", "comparative", "insights", "narrative"]
                }
            },
            "required": ["reasoning", "data", "summarization_type"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let data = required_str(&input, "data")
            .map_err(|_| failed(self.name(), "No data provided for summarization."))?;
        let reasoning = input["reasoning"].as_str().unwrap_or("");
        let summarization_type = input["summarization_type"].as_str().unwrap_or("brief");

        let prompt = format!(
            "{}\n\nData to summarize:\n{data}\n\nReasoning context for summarization: {reasoning}",
            prompt_for(summarization_type)
        );
        let response = self
            .provider
            .complete(ProviderRequest::prompt(&self.model, "", prompt, MAX_TOKENS))
            .await
            .map_err(|e| failed(self.name(), e))?;

        let text = response.text();
        if text.trim().is_empty() {
            return Ok("No summary generated.".into());
        }
        Ok(text)
    }
}
