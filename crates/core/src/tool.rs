//! Tool trait, registry, and dispatcher.
//!
//! Tools are the agent's only way to touch data: run SQL, inspect the
//! schema, build datasets. The registry is filled once at startup and is
//! read-only afterwards.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};
use crate::error::ToolError;
use crate::provider::ToolDefinition;
use crate::transcript::{ToolCallRequest, ToolOutcome};

/// The core Tool trait.
///
/// Implementations validate their own input; the registry passes it through
/// untouched. Returning `Err` yields an error-kind result for the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "execute_sql").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's input.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given input and return its text result.
    async fn execute(&self, input: serde_json::Value) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// A registry of available tools, keyed by name.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run one tool call and normalise the outcome.
    ///
    /// An unknown tool name is returned as `Err(ToolError::NotFound)`; every
    /// failure inside a known tool becomes `ToolOutcome::Error`.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> std::result::Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let start = std::time::Instant::now();
        let result = tool.execute(call.input.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                info!(tool = %call.name, call_id = %call.id, duration_ms, "Tool executed");
                Ok(ToolOutcome::Success(output))
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, duration_ms, error = %e, "Tool execution failed");
                Ok(ToolOutcome::Error(e.to_string()))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
