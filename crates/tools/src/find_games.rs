//! Team performance lookup: the team's games plus a win/loss summary.
//!
//! A name that matches a saved team group expands to the group's members;
//! anything else is a case-insensitive substring match, so "Key West" also
//! catches "Key West FC (1)".

use crate::{failed, optional_str, required_str, to_json};
use async_trait::async_trait;
use chrono::NaiveDate;
use pitchside_core::error::ToolError;
use pitchside_core::tool::Tool;
use pitchside_store::analytics::team_matches;
use pitchside_store::{DateRange, MatchStore, TeamFilter, TeamGroupStore, TeamReport};
use std::sync::Arc;
use tracing::debug;

pub struct FindGamesTool {
    store: Arc<MatchStore>,
    groups: Arc<TeamGroupStore>,
}

impl FindGamesTool {
    pub fn new(store: Arc<MatchStore>, groups: Arc<TeamGroupStore>) -> Self {
        Self { store, groups }
    }

    async fn filter_for(&self, team: &str) -> Result<TeamFilter, ToolError> {
        let group = self.groups.get(team).await.map_err(|e| failed(self.name(), e))?;
        Ok(match group {
            Some(group) if !group.teams.is_empty() => {
                debug!(group = %group.name, members = group.teams.len(), "Using team group");
                TeamFilter::Exact(group.teams)
            }
            _ => TeamFilter::Contains(team.to_string()),
        })
    }
}

/// Either bound may be open. Open bounds stay four-digit years so the
/// stored text dates still compare correctly.
fn period(start: Option<&str>, end: Option<&str>) -> Result<Option<DateRange>, ToolError> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ToolError::InvalidArguments(format!("invalid date '{s}', expected YYYY-MM-DD")))
    };
    let start = match start {
        Some(s) => parse(s)?,
        None => parse("0001-01-01")?,
    };
    let end = match end {
        Some(s) => parse(s)?,
        None => parse("9999-12-31")?,
    };
    DateRange::new(start, end)
        .map(Some)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[async_trait]
impl Tool for FindGamesTool {
    fn name(&self) -> &str {
        "find_games"
    }

    fn description(&self) -> &str {
        "PREFERRED tool for team performance. Finds all games for a team (including name variants and saved team groups) in an optional date range and returns the matches with a win/loss/draw summary."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "team": {
                    "type": "string",
                    "description": "Team name, partial team name, or saved team group name"
                },
                "start_date": {
                    "type": "string",
                    "description": "Start date in YYYY-MM-DD format (optional)"
                },
                "end_date": {
                    "type": "string",
                    "description": "End date in YYYY-MM-DD format (optional)"
                }
            },
            "required": ["team"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String, ToolError> {
        let team = required_str(&input, "team")?;
        let range = period(optional_str(&input, "start_date"), optional_str(&input, "end_date"))?;
        let filter = self.filter_for(team).await?;

        let records = self
            .store
            .matches_for(&filter, range.as_ref())
            .await
            .map_err(|e| failed(self.name(), e))?;
        let games = team_matches(&records, &filter);
        let summary = TeamReport::from_matches(&games);

        let team_names = match &filter {
            TeamFilter::Exact(names) => serde_json::json!(names),
            TeamFilter::Contains(_) => {
                let mut names: Vec<&str> = games.iter().map(|g| g.team.as_str()).collect();
                names.sort_unstable();
                names.dedup();
                serde_json::json!(names)
            }
        };

        let mut body = serde_json::json!({
            "team": team,
            "team_names": team_names,
            "start_date": optional_str(&input, "start_date"),
            "end_date": optional_str(&input, "end_date"),
            "matches_found": games.len(),
            "matches": games,
            "summary": summary,
        });
        if records.is_empty() {
            body["message"] = serde_json::Value::String(format!("No matches found for team '{team}'"));
        }
        to_json(self.name(), &body)
    }
}
