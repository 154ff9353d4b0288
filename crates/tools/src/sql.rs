//! SQL tools over the `input_data` table: run, describe, validate.

use crate::{failed, required_str, to_json};
use async_trait::async_trait;
use pitchside_core::error::ToolError;
use pitchside_core::tool::Tool;
use pitchside_store::MatchStore;
use std::sync::Arc;
use tracing::debug;

pub struct ExecuteSqlTool {
    store: Arc<MatchStore>,
}

impl ExecuteSqlTool {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ExecuteSqlTool {
    fn name(&self) -> &str {
        "execute_sql"
    }

    fn description(&self) -> &str {
        "Execute a read-only SQL query against the match table 'input_data' and return the rows as JSON. Always include a LIMIT clause (at most 20 rows)."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Explain why this SQL query is appropriate"
                },
                "query": {
                    "type": "string",
                    "description": "The SQL query to execute"
                }
            },
            "required": ["reasoning", "query"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let query = required_str(&input, "query")?;
        if let Some(reasoning) = input["reasoning"].as_str() {
            debug!(reasoning, query, "execute_sql");
        }

        let result = self
            .store
            .query_json(query)
            .await
            .map_err(|e| failed(self.name(), e))?;

        let shown = result.rows.len();
        let mut body = serde_json::json!({
            "row_count": result.row_count,
            "columns": result.columns,
            "rows": result.rows,
        });
        if result.truncated {
            body["truncated"] = serde_json::Value::Bool(true);
            body["note"] = serde_json::Value::String(format!(
                "Only the first {shown} of {} rows are shown; add a LIMIT or aggregate.",
                result.row_count
            ));
        }
        to_json(self.name(), &body)
    }
}

pub struct GetSchemaTool {
    store: Arc<MatchStore>,
}

impl GetSchemaTool {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetSchemaTool {
    fn name(&self) -> &str {
        "get_schema"
    }

    fn description(&self) -> &str {
        "Get the column names and types of the match table 'input_data'"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Why you need the schema information"
                }
            },
            "required": ["reasoning"]
        })
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<String, ToolError> {
        let schema = self.store.schema().await.map_err(|e| failed(self.name(), e))?;
        serde_json::to_string(&schema).map_err(|e| failed(self.name(), e))
    }
}

pub struct ValidateSqlTool {
    store: Arc<MatchStore>,
}

impl ValidateSqlTool {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ValidateSqlTool {
    fn name(&self) -> &str {
        "validate_sql"
    }

    fn description(&self) -> &str {
        "Validate a SQL query against 'input_data' without executing it"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Why you want to validate this query"
                },
                "query": {
                    "type": "string",
                    "description": "The SQL query to validate"
                }
            },
            "required": ["reasoning", "query"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let query = required_str(&input, "query")?;
        self.store
            .validate(query)
            .await
            .map_err(|e| failed(self.name(), format!("Query is invalid: {e}")))?;
        Ok("The SQL query is valid.".into())
    }
}
