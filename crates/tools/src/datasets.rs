//! Team dataset export and compact renderings of the whole dataset.

use crate::{failed, optional_str, required_str, to_json};
use async_trait::async_trait;
use pitchside_core::error::ToolError;
use pitchside_core::tool::Tool;
use pitchside_store::{CompactFormat, CompactReport, MatchStore, TeamFilter};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub struct BuildDatasetTool {
    store: Arc<MatchStore>,
    root: PathBuf,
}

impl BuildDatasetTool {
    /// Write datasets relative to the working directory.
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self {
            store,
            root: PathBuf::from("."),
        }
    }

    /// Write datasets relative to `root` instead.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

/// Output paths come from the model: keep them relative and inside the
/// working directory.
fn check_output_path(path: &str) -> Result<&Path, ToolError> {
    let p = Path::new(path);
    let escapes = p
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ToolError::InvalidArguments(format!(
            "output_file must be a relative path inside the working directory: {path}"
        )));
    }
    Ok(p)
}

#[async_trait]
impl Tool for BuildDatasetTool {
    fn name(&self) -> &str {
        "build_dataset"
    }

    fn description(&self) -> &str {
        "Create a filtered dataset for a specific team and save it as a JSON-lines file"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "team": {
                    "type": "string",
                    "description": "The team name to filter the dataset by (will search home_team and away_team)"
                },
                "output_file": {
                    "type": "string",
                    "description": "Relative path to save the filtered dataset, e.g. 'key_west.jsonl'"
                }
            },
            "required": ["team", "output_file"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let team = required_str(&input, "team")?;
        let output_file = required_str(&input, "output_file")?;
        let path = self.root.join(check_output_path(output_file)?);

        let row_count = self
            .store
            .export_jsonl(&TeamFilter::Contains(team.to_string()), &path)
            .await
            .map_err(|e| failed(self.name(), e))?;

        to_json(
            self.name(),
            &serde_json::json!({
                "row_count": row_count,
                "team": team,
                "output_file": output_file,
            }),
        )
    }
}

pub struct CompactDatasetTool {
    store: Arc<MatchStore>,
}

impl CompactDatasetTool {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self { store }
    }
}

/// Size of the dataset when no source file is known: its JSON-lines encoding.
fn encoded_size(records: &[pitchside_store::MatchRecord]) -> u64 {
    records
        .iter()
        .filter_map(|r| serde_json::to_string(r).ok())
        .map(|line| line.len() as u64 + 1)
        .sum()
}

#[async_trait]
impl Tool for CompactDatasetTool {
    fn name(&self) -> &str {
        "compact_dataset"
    }

    fn description(&self) -> &str {
        "Create a compact representation of the match data optimized for the context window"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "output_format": {
                    "type": "string",
                    "description": "Format style ('compact', 'table', or 'csv')",
                    "enum": ["compact", "table", "csv"]
                }
            }
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let format = match optional_str(&input, "output_format") {
            Some(s) => s
                .parse::<CompactFormat>()
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))?,
            None => CompactFormat::default(),
        };

        let records = self
            .store
            .all_matches()
            .await
            .map_err(|e| failed(self.name(), e))?;
        let original_size = match self.store.source_size().await {
            Some(size) => size,
            None => encoded_size(&records),
        };

        let report = CompactReport::build(&records, original_size, format);
        serde_json::to_string(&report).map_err(|e| failed(self.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_store;

    #[test]
    fn output_paths_stay_inside() {
        assert!(check_output_path("teams/key_west.jsonl").is_ok());
        assert!(check_output_path("../escape.jsonl").is_err());
        assert!(check_output_path("/etc/passwd").is_err());
    }

    #[tokio::test]
    async fn build_dataset_writes_team_rows() {
        let dir = tempfile::tempdir().unwrap();
        let tool = BuildDatasetTool::new(Arc::new(sample_store().await)).with_root(dir.path());

        let out = tool
            .execute(serde_json::json!({"team": "Strikers", "output_file": "teams/strikers.jsonl"}))
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(body["row_count"], 3);
        assert_eq!(body["team"], "Strikers");

        let written = std::fs::read_to_string(dir.path().join("teams/strikers.jsonl")).unwrap();
        assert_eq!(written.lines().count(), 3);
    }

    #[tokio::test]
    async fn build_dataset_without_matches_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tool = BuildDatasetTool::new(Arc::new(sample_store().await)).with_root(dir.path());
        let err = tool
            .execute(serde_json::json!({"team": "Nobody", "output_file": "nobody.jsonl"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No matches found for team 'Nobody'"));
        assert!(!dir.path().join("nobody.jsonl").exists());
    }

    #[tokio::test]
    async fn compact_dataset_reports_sizes() {
        let tool = CompactDatasetTool::new(Arc::new(sample_store().await));
        let out = tool.execute(serde_json::json!({})).await.unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(report["row_count"], 17);
        let result = report["result"].as_str().unwrap();
        assert!(result.starts_with("===== 2025-03-01 =====\nKey West FC 2-1 The Strikers (U12 Premier)\n"));
        assert!(result.contains("Key West FC vs The Strikers"));
        assert!(report["compression_ratio"].as_f64().unwrap() > 1.0);
    }

    #[tokio::test]
    async fn compact_dataset_csv_and_bad_format() {
        let tool = CompactDatasetTool::new(Arc::new(sample_store().await));
        let out = tool.execute(serde_json::json!({"output_format": "csv"})).await.unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(report["result"].as_str().unwrap().starts_with("date,home_team"));

        let err = tool.execute(serde_json::json!({"output_format": "xml"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
