//! Date coverage of the dataset, optionally narrowed to one team and period.

use crate::{failed, optional_str, to_json};
use async_trait::async_trait;
use pitchside_core::error::ToolError;
use pitchside_core::tool::Tool;
use pitchside_store::{DateRange, MatchStore, TeamFilter};
use std::sync::Arc;

const PREVIEW_MATCHES: usize = 10;

pub struct CheckDateRangeTool {
    store: Arc<MatchStore>,
}

impl CheckDateRangeTool {
    pub fn new(store: Arc<MatchStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CheckDateRangeTool {
    fn name(&self) -> &str {
        "check_date_range"
    }

    fn description(&self) -> &str {
        "Check if data exists for a specific date range and return the available date range in the dataset"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "team_name": {
                    "type": "string",
                    "description": "The team name to search for (optional)"
                },
                "start_date": {
                    "type": "string",
                    "description": "Start date in YYYY-MM-DD format (optional)"
                },
                "end_date": {
                    "type": "string",
                    "description": "End date in YYYY-MM-DD format (optional)"
                }
            }
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let dataset_range = match self.store.date_range().await.map_err(|e| failed(self.name(), e))? {
            Some((earliest, latest)) => serde_json::json!({
                "earliest_date": earliest,
                "latest_date": latest,
            }),
            None => serde_json::json!({
                "earliest_date": "unknown",
                "latest_date": "unknown",
            }),
        };

        let team = optional_str(&input, "team_name");
        let start = optional_str(&input, "start_date");
        let end = optional_str(&input, "end_date");

        let (Some(team), Some(start), Some(end)) = (team, start, end) else {
            return to_json(self.name(), &serde_json::json!({ "dataset_range": dataset_range }));
        };

        let range = DateRange::parse(start, end).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let matches = self
            .store
            .matches_for(&TeamFilter::Contains(team.to_string()), Some(&range))
            .await
            .map_err(|e| failed(self.name(), e))?;

        let preview: Vec<_> = matches.iter().take(PREVIEW_MATCHES).collect();
        to_json(
            self.name(),
            &serde_json::json!({
                "dataset_range": dataset_range,
                "matches_found": matches.len(),
                "matches": preview,
                "has_more_matches": matches.len() > PREVIEW_MATCHES,
            }),
        )
    }
}
