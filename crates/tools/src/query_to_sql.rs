//! Natural language to SQL through a nested model call.

use crate::{failed, required_str};
use async_trait::async_trait;
use pitchside_core::error::ToolError;
use pitchside_core::provider::{Provider, ProviderRequest};
use pitchside_core::tool::Tool;
use std::sync::Arc;

const MAX_TOKENS: u32 = 1000;

const SYSTEM: &str = "You translate questions about soccer match data into SQLite SQL. \
The only table is 'input_data'. Reply with a single SELECT statement and nothing else: \
no explanation, no code fences.";

pub struct QueryToSqlTool {
    provider: Arc<dyn Provider>,
    model: String,
}

impl QueryToSqlTool {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

/// Drop a surrounding Markdown code fence, if the model added one anyway.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Skip an info string such as "sql".
    let inner = match inner.find('\n') {
        Some(pos) if !inner[..pos].trim().contains(' ') => &inner[pos + 1..],
        _ => inner,
    };
    inner.trim()
}

#[async_trait]
impl Tool for QueryToSqlTool {
    fn name(&self) -> &str {
        "query_to_sql"
    }

    fn description(&self) -> &str {
        "Translate a natural language question into a SQL query over 'input_data'"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Detailed reasoning for the SQL translation"
                },
                "question": {
                    "type": "string",
                    "description": "The natural language question"
                },
                "schema_info": {
                    "type": "string",
                    "description": "Schema information to inform the translation"
                }
            },
            "required": ["reasoning", "question", "schema_info"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let question = required_str(&input, "question")?;
        let schema_info = input["schema_info"].as_str().unwrap_or("");
        let reasoning = input["reasoning"].as_str().unwrap_or("");

        let prompt = format!(
            "Schema:\n{schema_info}\n\nQuestion: {question}\n\nReasoning: {reasoning}"
        );
        let response = self
            .provider
            .complete(ProviderRequest::prompt(&self.model, SYSTEM, prompt, MAX_TOKENS))
            .await
            .map_err(|e| failed(self.name(), e))?;

        let text = response.text();
        let sql = strip_fences(&text);
        if sql.is_empty() {
            return Err(failed(self.name(), "No SQL generated."));
        }
        Ok(sql.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedProvider, DownProvider};

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("SELECT 1"), "SELECT 1");
        assert_eq!(strip_fences("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_fences("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[tokio::test]
    async fn returns_generated_sql() {
        let provider = Arc::new(CannedProvider::new("```sql\nSELECT COUNT(*) FROM input_data\n```"));
        let tool = QueryToSqlTool::new(provider.clone(), "claude-3-7-sonnet-20250219");
        let sql = tool
            .execute(serde_json::json!({
                "reasoning": "count",
                "question": "How many matches?",
                "schema_info": "date TEXT, home_team TEXT"
            }))
            .await
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM input_data");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].model, "claude-3-7-sonnet-20250219");
        assert!(requests[0].tools.is_empty());
        assert!(requests[0].turns[0].text().contains("How many matches?"));
    }

    #[tokio::test]
    async fn provider_failure_is_tool_failure() {
        let tool = QueryToSqlTool::new(Arc::new(DownProvider), "m");
        let err = tool
            .execute(serde_json::json!({"reasoning": "r", "question": "q", "schema_info": ""}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn blank_answer_is_an_error() {
        let tool = QueryToSqlTool::new(Arc::new(CannedProvider::new("  ")), "m");
        let err = tool
            .execute(serde_json::json!({"reasoning": "r", "question": "q", "schema_info": ""}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No SQL generated."));
    }
}
