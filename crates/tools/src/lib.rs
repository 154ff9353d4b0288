//! Data tools for the pitchside agent.
//!
//! Every tool reads from the shared match dataset or the team group store;
//! `query_to_sql` and `summarize_results` also make a nested model call.
//! `complete_task` is the completion tool: calling it ends the agent loop.

pub mod check_date_range;
pub mod complete_task;
pub mod datasets;
pub mod find_games;
pub mod query_to_sql;
pub mod sql;
pub mod summarize;

use pitchside_core::error::ToolError;
use pitchside_core::provider::Provider;
use pitchside_core::tool::ToolRegistry;
use pitchside_store::{MatchStore, TeamGroupStore};
use std::sync::Arc;

pub use complete_task::COMPLETION_TOOL;

/// Create the registry with every data tool.
pub fn default_registry(
    store: Arc<MatchStore>,
    groups: Arc<TeamGroupStore>,
    provider: Arc<dyn Provider>,
    model: impl Into<String>,
) -> ToolRegistry {
    let model = model.into();
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(sql::ExecuteSqlTool::new(store.clone())));
    registry.register(Box::new(sql::GetSchemaTool::new(store.clone())));
    registry.register(Box::new(sql::ValidateSqlTool::new(store.clone())));
    registry.register(Box::new(query_to_sql::QueryToSqlTool::new(provider.clone(), model.clone())));
    registry.register(Box::new(summarize::SummarizeResultsTool::new(provider, model)));
    registry.register(Box::new(check_date_range::CheckDateRangeTool::new(store.clone())));
    registry.register(Box::new(find_games::FindGamesTool::new(store.clone(), groups)));
    registry.register(Box::new(datasets::BuildDatasetTool::new(store.clone())));
    registry.register(Box::new(datasets::CompactDatasetTool::new(store)));
    registry.register(Box::new(complete_task::CompleteTaskTool));
    registry
}

/// A required, non-blank string argument.
pub(crate) fn required_str<'a>(input: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    input[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

/// An optional string argument; blank counts as absent.
pub(crate) fn optional_str<'a>(input: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    input[key].as_str().map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn failed(tool_name: &str, reason: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn to_json(tool_name: &str, value: &serde_json::Value) -> Result<String, ToolError> {
    serde_json::to_string(value).map_err(|e| failed(tool_name, e))
}
