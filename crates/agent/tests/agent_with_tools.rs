//! The agent loop driving the real data tools with a scripted model.

use async_trait::async_trait;
use chrono::NaiveDate;
use pitchside_agent::{AgentLoop, Termination, opening_message};
use pitchside_core::error::ProviderError;
use pitchside_core::provider::{Provider, ProviderRequest, ProviderResponse, ResponseBlock};
use pitchside_core::transcript::{ContentItem, ToolCallRequest, ToolOutcome, Transcript};
use pitchside_store::{MatchStore, TeamGroupStore, parse_records};
use std::sync::{Arc, Mutex};

const MATCHES: &str = r#"
{"date": "2025-03-01", "home_team": "Key West FC", "away_team": "The Strikers", "home_score": 2, "away_score": 1, "league": "U12 Premier"}
{"date": "2025-03-08", "home_team": "Harbor United", "away_team": "Key West FC (1)", "home_score": 3, "away_score": 3, "league": "U12 Premier"}
{"date": "2025-03-15", "home_team": "The Strikers", "away_team": "Harbor United", "home_score": 0, "away_score": 4, "league": "U12 Premier"}
{"date": "2025-04-02", "home_team": "Key West FC", "away_team": "Harbor United", "home_score": 1, "away_score": 2, "league": "U12 Premier"}
"#;

struct ScriptedProvider {
    responses: Mutex<Vec<Vec<ResponseBlock>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Vec<ResponseBlock>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::InvalidResponse("script exhausted".into()));
        }
        Ok(ProviderResponse {
            id: "msg_scripted".into(),
            model: "scripted".into(),
            content: responses.remove(0),
            usage: None,
            stop_reason: Some("tool_use".into()),
        })
    }
}

fn text(s: &str) -> ResponseBlock {
    ResponseBlock::Text { text: s.into() }
}

fn tool(id: &str, name: &str, input: serde_json::Value) -> ResponseBlock {
    ResponseBlock::ToolCall(ToolCallRequest {
        id: id.into(),
        name: name.into(),
        input,
    })
}

async fn agent(provider: Arc<ScriptedProvider>) -> AgentLoop {
    let records = parse_records(MATCHES).unwrap();
    let store = Arc::new(MatchStore::from_records(records).await.unwrap());
    let groups = Arc::new(TeamGroupStore::in_memory().await.unwrap());
    let registry = pitchside_tools::default_registry(store, groups, provider.clone(), "scripted");
    AgentLoop::builder(provider, Arc::new(registry))
        .thinking_budget(None)
        .max_iterations(5)
        .build()
}

/// Tool results in the order they were appended.
fn results(transcript: &Transcript) -> Vec<(String, ToolOutcome)> {
    transcript
        .turns()
        .iter()
        .flat_map(|t| t.content.iter())
        .filter_map(|item| match item {
            ContentItem::ToolResult { tool_call_id, outcome } => Some((tool_call_id.clone(), outcome.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn team_question_runs_tools_then_completes() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        vec![
            text("Let me check the dates first."),
            tool(
                "t1",
                "check_date_range",
                serde_json::json!({"team_name": "Key West", "start_date": "2025-03-01", "end_date": "2025-03-31"}),
            ),
            tool(
                "t2",
                "find_games",
                serde_json::json!({"team": "Key West", "start_date": "2025-03-01", "end_date": "2025-03-31"}),
            ),
        ],
        vec![
            text("Key West FC won one and drew one in March 2025."),
            tool("t3", "complete_task", serde_json::json!({"reasoning": "1 win, 1 draw"})),
        ],
    ]));

    let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    let mut transcript = Transcript::with_question(opening_message(
        "How did Key West FC do in March 2025?",
        today,
        "matches.jsonl",
        &[],
    ));

    let outcome = agent(provider.clone()).await.run(&mut transcript).await.unwrap();

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.round_trips, 2);
    assert_eq!(outcome.tool_calls, 3);
    assert_eq!(outcome.text, "Key West FC won one and drew one in March 2025.");
    assert_eq!(outcome.summary.as_deref(), Some("1 win, 1 draw"));

    let requests = provider.requests.lock().unwrap();
    let first = &requests[0];
    assert!(first.turns[0].text().contains("2025-03-01 to 2025-03-31"));
    assert_eq!(first.tools.len(), 10);

    let results = results(&transcript);
    assert_eq!(results.len(), 3);
    let dates: serde_json::Value = serde_json::from_str(results[0].1.text()).unwrap();
    assert_eq!(dates["matches_found"], 2);
    let games: serde_json::Value = serde_json::from_str(results[1].1.text()).unwrap();
    assert_eq!(games["summary"]["wins"], 1);
    assert_eq!(games["summary"]["draws"], 1);
    assert_eq!(results[2].1, ToolOutcome::success("Task completed"));
    assert!(transcript.unanswered_calls().is_empty());
}

#[tokio::test]
async fn bad_sql_is_reported_back_and_the_model_recovers() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        vec![tool("s1", "execute_sql", serde_json::json!({"reasoning": "count", "query": "SELECT * FROM missing_table"}))],
        vec![tool(
            "s2",
            "execute_sql",
            serde_json::json!({"reasoning": "count", "query": "SELECT COUNT(*) AS n FROM input_data"}),
        )],
        vec![text("There are 4 matches in the dataset.")],
    ]));
    let mut transcript = Transcript::with_question("How many matches are there?");

    let outcome = agent(provider.clone()).await.run(&mut transcript).await.unwrap();
    assert_eq!(outcome.termination, Termination::Answered);
    assert_eq!(outcome.text, "There are 4 matches in the dataset.");

    let results = results(&transcript);
    assert!(results[0].1.is_error());
    assert!(results[0].1.text().contains("missing_table"));
    assert!(!results[0].1.text().contains("panicked"));
    let counted: serde_json::Value = serde_json::from_str(results[1].1.text()).unwrap();
    assert_eq!(counted["rows"][0]["n"], 4);

    // The second request already carried the error.
    let requests = provider.requests.lock().unwrap();
    let second = &requests[1];
    let last = second.turns.last().unwrap();
    assert!(matches!(&last.content[0], ContentItem::ToolResult { outcome, .. } if outcome.is_error()));
}
