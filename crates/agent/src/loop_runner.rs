//! The agent loop: model call, ordered tool dispatch, completion and budget.

use async_trait::async_trait;
use pitchside_config::AppConfig;
use pitchside_core::error::{Error, Result};
use pitchside_core::provider::{Provider, ProviderRequest, ToolDefinition};
use pitchside_core::tool::ToolRegistry;
use pitchside_core::transcript::{ContentItem, Role, ToolCallRequest, ToolOutcome, Transcript, Turn};
use pitchside_providers::{RetryPolicy, RetryingProvider};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::prompt::SYSTEM_PROMPT;

/// Text stored for a response that carried neither text nor tool calls.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "I don't have anything further to add.";

/// Result given to tool calls that follow the completion tool in one turn.
pub const SKIPPED_AFTER_COMPLETION: &str = "skipped: task already completed";

/// Result given to calls an earlier, aborted run never answered.
pub const NOT_EXECUTED: &str = "not executed: the previous run stopped before this call ran";

/// Why an invocation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The completion tool was called
    Completed,
    /// The model answered with text and no tool calls
    Answered,
    /// Interactive input ended
    InputClosed,
    /// The round-trip budget ran out
    BudgetExhausted,
}

/// What one loop invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    /// Text of the terminating response, or the last non-empty assistant
    /// text of this invocation
    pub text: String,
    pub termination: Termination,
    pub round_trips: u32,
    pub tool_calls: u32,
    /// Free-text field of the completion tool call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AgentOutcome {
    /// Budget ran out before any text was produced.
    pub fn is_incomplete(&self) -> bool {
        self.termination == Termination::BudgetExhausted && self.text.trim().is_empty()
    }

    fn absorb(&mut self, other: AgentOutcome) {
        self.round_trips += other.round_trips;
        self.tool_calls += other.tool_calls;
        self.termination = other.termination;
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        self.text = other.text;
    }
}

/// Where interactive sessions get their next user message.
#[async_trait]
pub trait InputSource: Send {
    /// Present an answer.
    fn show(&mut self, outcome: &AgentOutcome);

    /// Present a failed turn. The session carries on.
    fn report_error(&mut self, err: &Error) {
        let _ = err;
    }

    /// The next user message, or `None` to end the session.
    async fn next_message(&mut self, transcript: &Transcript) -> Option<String>;
}

/// The tool-calling loop over one transcript.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    model: String,
    max_tokens: u32,
    thinking_budget: Option<u32>,
    temperature: Option<f32>,
    max_iterations: u32,
    completion_tool: String,
}

/// Builder for [`AgentLoop`]. Defaults follow [`AppConfig::default`].
pub struct AgentLoopBuilder {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    model: String,
    max_tokens: u32,
    thinking_budget: Option<u32>,
    temperature: Option<f32>,
    max_iterations: u32,
    retry_policy: Option<RetryPolicy>,
    completion_tool: String,
}

impl AgentLoopBuilder {
    fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        let defaults = AppConfig::default();
        Self {
            provider,
            tools,
            system_prompt: SYSTEM_PROMPT.to_string(),
            model: defaults.model.clone(),
            max_tokens: defaults.max_tokens,
            thinking_budget: defaults.reasoning_budget(),
            temperature: Some(defaults.temperature),
            max_iterations: defaults.agent.max_iterations,
            retry_policy: None,
            completion_tool: defaults.agent.completion_tool,
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// `None` turns the reasoning trace off.
    pub fn thinking_budget(mut self, budget: Option<u32>) -> Self {
        self.thinking_budget = budget;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Round trips allowed per invocation. Zero is treated as one.
    pub fn max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Back off and retry on rate limits.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn completion_tool(mut self, name: impl Into<String>) -> Self {
        self.completion_tool = name.into();
        self
    }

    /// Take model, budgets, sampling, loop and retry settings from config.
    pub fn configure(self, config: &AppConfig) -> Self {
        self.model(&config.model)
            .max_tokens(config.max_tokens)
            .thinking_budget(config.reasoning_budget())
            .temperature(config.temperature)
            .max_iterations(config.agent.max_iterations)
            .completion_tool(&config.agent.completion_tool)
            .retry_policy(RetryPolicy::from_settings(&config.retry))
    }

    pub fn build(self) -> AgentLoop {
        let provider: Arc<dyn Provider> = match self.retry_policy {
            Some(policy) => Arc::new(RetryingProvider::new(self.provider, policy)),
            None => self.provider,
        };
        if !self.tools.contains(&self.completion_tool) {
            warn!(tool = %self.completion_tool, "Completion tool is not registered");
        }
        AgentLoop {
            provider,
            tools: self.tools,
            system_prompt: self.system_prompt,
            model: self.model,
            max_tokens: self.max_tokens,
            thinking_budget: self.thinking_budget,
            temperature: self.temperature,
            max_iterations: self.max_iterations,
            completion_tool: self.completion_tool,
        }
    }
}

impl AgentLoop {
    pub fn builder(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> AgentLoopBuilder {
        AgentLoopBuilder::new(provider, tools)
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, transcript: &Transcript, tools: &[ToolDefinition]) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            turns: transcript.turns().to_vec(),
            tools: tools.to_vec(),
            max_tokens: self.max_tokens,
            thinking_budget: self.thinking_budget,
            temperature: self.temperature,
        }
    }

    /// Run until the model answers, the completion tool is called, or the
    /// budget runs out.
    ///
    /// A transcript carried over from an earlier invocation is resumed as is;
    /// nothing is re-seeded. Tool calls left without a result by an aborted
    /// run are answered with a "not executed" error first. Gateway failures and unknown tools return `Err`,
    /// and every turn appended before the failure stays in the transcript.
    pub async fn run(&self, transcript: &mut Transcript) -> Result<AgentOutcome> {
        info!(
            transcript_id = %transcript.id,
            turns = transcript.len(),
            max_iterations = self.max_iterations,
            "Running agent loop"
        );

        close_unanswered_calls(transcript);

        let definitions = self.tools.definitions();
        let mut round_trips = 0u32;
        let mut tool_calls = 0u32;
        let mut last_text: Option<String> = None;

        while round_trips < self.max_iterations {
            round_trips += 1;
            debug!(
                round_trip = round_trips,
                turns = transcript.len(),
                tools = definitions.len(),
                "Calling model"
            );

            let response = self.provider.complete(self.request(transcript, &definitions)).await?;

            let text = response.text();
            let has_text = !text.trim().is_empty();
            let calls: Vec<ToolCallRequest> = response.tool_calls().into_iter().cloned().collect();
            info!(
                round_trip = round_trips,
                tool_calls = calls.len(),
                has_text,
                stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
                output_tokens = response.usage.map(|u| u.output_tokens).unwrap_or(0),
                "Model responded"
            );

            let mut content: Vec<ContentItem> = response.content.into_iter().map(ContentItem::from).collect();
            if !has_text && calls.is_empty() {
                warn!(round_trip = round_trips, "Empty model response, substituting placeholder");
                content.push(ContentItem::text(EMPTY_RESPONSE_PLACEHOLDER));
            }
            transcript.push(Turn::assistant(content));
            if has_text {
                last_text = Some(text.clone());
            }

            if calls.is_empty() {
                let text = if has_text {
                    text
                } else {
                    EMPTY_RESPONSE_PLACEHOLDER.to_string()
                };
                info!(round_trips, tool_calls, "Model answered");
                return Ok(AgentOutcome {
                    text,
                    termination: Termination::Answered,
                    round_trips,
                    tool_calls,
                    summary: None,
                });
            }

            // Sequential: each result lands before the next call runs.
            // `completed` holds the summary, or `None` when the completion
            // tool itself reported an error.
            let mut completed: Option<Option<String>> = None;
            for call in &calls {
                let outcome = if completed.is_some() {
                    debug!(tool = %call.name, call_id = %call.id, "Skipping call after completion");
                    ToolOutcome::error(SKIPPED_AFTER_COMPLETION)
                } else {
                    tool_calls += 1;
                    let outcome = self.tools.dispatch(call).await?;
                    if call.name == self.completion_tool {
                        if outcome.is_error() {
                            warn!(call_id = %call.id, error = outcome.text(), "Completion tool failed, ending anyway");
                            completed = Some(None);
                        } else {
                            completed = Some(Some(completion_summary(&call.input)));
                        }
                    }
                    outcome
                };
                transcript.push(Turn::tool_result(&call.id, outcome));
            }

            if let Some(summary) = completed {
                let text = if has_text {
                    text
                } else {
                    last_text.unwrap_or_default()
                };
                info!(round_trips, tool_calls, "Task completed");
                return Ok(AgentOutcome {
                    text,
                    termination: Termination::Completed,
                    round_trips,
                    tool_calls,
                    summary,
                });
            }
        }

        warn!(
            transcript_id = %transcript.id,
            round_trips,
            "Iteration budget exhausted"
        );
        Ok(AgentOutcome {
            text: last_text.unwrap_or_default(),
            termination: Termination::BudgetExhausted,
            round_trips,
            tool_calls,
            summary: None,
        })
    }

    /// Answer, then wait for the next user message, until the input closes.
    ///
    /// Each user message gets a fresh iteration budget. Gateway failures are
    /// reported to the input source and the session continues; any other
    /// error ends it.
    pub async fn run_interactive(
        &self,
        transcript: &mut Transcript,
        input: &mut dyn InputSource,
    ) -> Result<AgentOutcome> {
        let mut totals = AgentOutcome {
            text: String::new(),
            termination: Termination::InputClosed,
            round_trips: 0,
            tool_calls: 0,
            summary: None,
        };

        let mut needs_input = !matches!(transcript.last(), Some(turn) if turn.role == Role::User);
        loop {
            if needs_input {
                match input.next_message(transcript).await {
                    Some(message) if message.trim().is_empty() => continue,
                    Some(message) => transcript.push(Turn::user(message)),
                    None => {
                        info!(
                            round_trips = totals.round_trips,
                            tool_calls = totals.tool_calls,
                            "Input closed, ending session"
                        );
                        totals.termination = Termination::InputClosed;
                        return Ok(totals);
                    }
                }
            }
            needs_input = true;

            match self.run(transcript).await {
                Ok(outcome) => {
                    input.show(&outcome);
                    totals.absorb(outcome);
                }
                Err(err @ Error::Provider(_)) => {
                    warn!(error = %err, "Model call failed");
                    input.report_error(&err);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Pair every dangling tool call with an error result.
fn close_unanswered_calls(transcript: &mut Transcript) {
    for call_id in transcript.unanswered_calls() {
        warn!(transcript_id = %transcript.id, call_id = %call_id, "Closing unanswered tool call");
        transcript.push(Turn::tool_result(call_id, ToolOutcome::error(NOT_EXECUTED)));
    }
}

/// The completion tool's free-text field.
fn completion_summary(input: &serde_json::Value) -> String {
    input
        .get("reasoning")
        .and_then(|v| v.as_str())
        .or_else(|| input.as_object()?.values().find_map(|v| v.as_str()))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use pitchside_core::error::{ProviderError, ToolError};
    use std::collections::VecDeque;
    use std::time::Duration;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(DoneTool));
        Arc::new(registry)
    }

    fn agent(provider: Arc<SequentialMockProvider>) -> AgentLoop {
        AgentLoop::builder(provider, registry())
            .model("test-model")
            .thinking_budget(None)
            .build()
    }

    fn echo(id: &str, text: &str) -> ToolCallRequest {
        call(id, "echo", serde_json::json!({"text": text}))
    }

    #[tokio::test]
    async fn completion_tool_ends_loop_after_one_round_trip() {
        let provider = Arc::new(SequentialMockProvider::new(vec![tool_response(
            "Key West FC won 3 of 4.",
            vec![
                call("c1", "complete_task", serde_json::json!({"reasoning": "done"})),
                echo("c2", "never runs"),
            ],
        )]));
        let mut transcript = Transcript::with_question("How did Key West FC do?");

        let outcome = agent(provider.clone()).run(&mut transcript).await.unwrap();

        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.round_trips, 1);
        assert_eq!(outcome.tool_calls, 1);
        assert_eq!(outcome.text, "Key West FC won 3 of 4.");
        assert_eq!(outcome.summary.as_deref(), Some("done"));
        assert_eq!(provider.call_count(), 1);

        let turns = transcript.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(
            turns[2].content,
            vec![ContentItem::ToolResult {
                tool_call_id: "c1".into(),
                outcome: ToolOutcome::success("Task completed"),
            }]
        );
        assert_eq!(
            turns[3].content,
            vec![ContentItem::ToolResult {
                tool_call_id: "c2".into(),
                outcome: ToolOutcome::error(SKIPPED_AFTER_COMPLETION),
            }]
        );
        assert!(transcript.unanswered_calls().is_empty());
    }

    #[tokio::test]
    async fn completion_without_text_falls_back_to_earlier_text() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response("Checking the data.", vec![echo("c1", "rows")]),
            tool_response("", vec![call("c2", "complete_task", serde_json::json!({"reasoning": "all done"}))]),
        ]));
        let mut transcript = Transcript::with_question("q");

        let outcome = agent(provider).run(&mut transcript).await.unwrap();
        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(outcome.text, "Checking the data.");
        assert_eq!(outcome.round_trips, 2);
    }

    #[tokio::test]
    async fn failed_completion_call_still_ends_the_run() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response(
                "Here is the answer.",
                vec![
                    call("c1", "complete_task", serde_json::json!({"reasoning": ""})),
                    echo("c2", "late"),
                ],
            ),
            text_response("never requested"),
        ]));
        let mut transcript = Transcript::with_question("q");

        let outcome = agent(provider.clone()).run(&mut transcript).await.unwrap();
        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(outcome.round_trips, 1);
        assert_eq!(outcome.text, "Here is the answer.");
        assert!(outcome.summary.is_none());

        let turns = transcript.turns();
        let ContentItem::ToolResult { outcome, .. } = &turns[2].content[0] else {
            panic!("expected a tool result");
        };
        assert!(outcome.is_error());
        assert!(outcome.text().contains("No reasoning provided"));
        let ContentItem::ToolResult { outcome, .. } = &turns[3].content[0] else {
            panic!("expected a tool result");
        };
        assert_eq!(outcome.text(), SKIPPED_AFTER_COMPLETION);
        assert!(transcript.unanswered_calls().is_empty());
    }

    #[tokio::test]
    async fn resumed_transcript_with_dangling_call_is_repaired_first() {
        let provider = Arc::new(SequentialMockProvider::new(vec![text_response("Fresh answer.")]));
        let mut transcript = Transcript::with_question("q");
        transcript.push(Turn::assistant(vec![ContentItem::ToolCall(ToolCallRequest {
            id: "dangling".into(),
            name: "echo".into(),
            input: serde_json::json!({"text": "lost"}),
        })]));
        transcript.push(Turn::user("Try again?"));
        assert_eq!(transcript.unanswered_calls(), vec!["dangling".to_string()]);

        let outcome = agent(provider.clone()).run(&mut transcript).await.unwrap();
        assert_eq!(outcome.text, "Fresh answer.");
        assert!(transcript.unanswered_calls().is_empty());

        let sent = &provider.requests()[0];
        let repaired = sent
            .turns
            .iter()
            .find_map(|turn| match &turn.content[0] {
                ContentItem::ToolResult { tool_call_id, outcome } if tool_call_id == "dangling" => Some(outcome),
                _ => None,
            })
            .expect("dangling call answered before the gateway call");
        assert!(repaired.is_error());
        assert_eq!(repaired.text(), NOT_EXECUTED);
    }

    #[tokio::test]
    async fn unknown_tool_leaves_transcript_resumable() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response("", vec![call("u1", "no_such_tool", serde_json::json!({}))]),
            text_response("Recovered."),
        ]));
        let agent = agent(provider.clone());
        let mut transcript = Transcript::with_question("q");

        assert!(agent.run(&mut transcript).await.is_err());
        assert_eq!(transcript.unanswered_calls(), vec!["u1".to_string()]);

        transcript.push(Turn::user("Please continue."));
        let outcome = agent.run(&mut transcript).await.unwrap();
        assert_eq!(outcome.text, "Recovered.");
        assert_eq!(provider.call_count(), 2);
        let sent = &provider.requests()[1];
        assert!(sent.turns.iter().any(|turn| turn.is_tool_result()));
    }

    #[tokio::test]
    async fn budget_bounds_round_trips() {
        let responses = (0..3)
            .map(|i| tool_response("", vec![echo(&format!("c{i}"), "again")]))
            .collect();
        let provider = Arc::new(SequentialMockProvider::new(responses));
        let mut transcript = Transcript::with_question("q");

        let outcome = AgentLoop::builder(provider.clone(), registry())
            .max_iterations(3)
            .build()
            .run(&mut transcript)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(outcome.round_trips, 3);
        assert_eq!(provider.call_count(), 3);
        assert!(outcome.is_incomplete());
        assert!(transcript.unanswered_calls().is_empty());
    }

    #[tokio::test]
    async fn budget_exhaustion_keeps_last_commentary() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response("Looking at March.", vec![echo("c1", "a")]),
            tool_response("", vec![echo("c2", "b")]),
        ]));
        let mut transcript = Transcript::with_question("q");

        let outcome = AgentLoop::builder(provider, registry())
            .max_iterations(2)
            .build()
            .run(&mut transcript)
            .await
            .unwrap();
        assert_eq!(outcome.termination, Termination::BudgetExhausted);
        assert_eq!(outcome.text, "Looking at March.");
        assert!(!outcome.is_incomplete());
    }

    #[tokio::test]
    async fn every_call_is_answered_before_next_request() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response("", vec![echo("a", "first"), echo("b", "second")]),
            text_response("Both done."),
        ]));
        let mut transcript = Transcript::with_question("q");

        let outcome = agent(provider.clone()).run(&mut transcript).await.unwrap();
        assert_eq!(outcome.text, "Both done.");
        assert_eq!(outcome.tool_calls, 2);

        let second = &provider.requests()[1];
        let ids: Vec<&str> = second
            .turns
            .iter()
            .filter_map(|t| match &t.content[0] {
                ContentItem::ToolResult { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(second.turns.len(), 4);
    }

    #[tokio::test]
    async fn empty_response_gets_placeholder() {
        let provider = Arc::new(SequentialMockProvider::new(vec![empty_response()]));
        let mut transcript = Transcript::with_question("q");

        let outcome = agent(provider).run(&mut transcript).await.unwrap();
        assert_eq!(outcome.termination, Termination::Answered);
        assert_eq!(outcome.text, EMPTY_RESPONSE_PLACEHOLDER);
        assert_eq!(
            transcript.last().unwrap().content,
            vec![ContentItem::text(EMPTY_RESPONSE_PLACEHOLDER)]
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let provider = Arc::new(SequentialMockProvider::new(vec![tool_response(
            "",
            vec![call("c1", "drop_tables", serde_json::json!({}))],
        )]));
        let mut transcript = Transcript::with_question("q");

        let err = agent(provider).run(&mut transcript).await.unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::NotFound(ref name)) if name == "drop_tables"));
        // The assistant turn stays; nothing is rolled back.
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn tool_failure_is_fed_back_to_the_model() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response(
                "",
                vec![call("c1", "echo", serde_json::json!({"text": "SELECT * FROM missing_table", "fail": true}))],
            ),
            text_response("That table does not exist."),
        ]));
        let mut transcript = Transcript::with_question("q");

        let outcome = agent(provider.clone()).run(&mut transcript).await.unwrap();
        assert_eq!(outcome.text, "That table does not exist.");

        let second = &provider.requests()[1];
        assert_eq!(
            second.turns.last().unwrap().content,
            vec![ContentItem::ToolResult {
                tool_call_id: "c1".into(),
                outcome: ToolOutcome::error("echo failed: no such table: missing_table"),
            }]
        );
    }

    #[tokio::test]
    async fn gateway_error_is_returned() {
        let provider = Arc::new(SequentialMockProvider::with_results(vec![Err(ProviderError::Network(
            "connection reset".into(),
        ))]));
        let mut transcript = Transcript::with_question("q");

        let err = agent(provider).run(&mut transcript).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn resumed_transcript_is_not_reseeded() {
        let mut transcript = Transcript::with_question("How did Key West FC do?");
        transcript.push(Turn::assistant(vec![ContentItem::text("They won 3.")]));
        transcript.push(Turn::user("And in April?"));

        let provider = Arc::new(SequentialMockProvider::new(vec![text_response("Two losses in April.")]));
        let outcome = agent(provider.clone()).run(&mut transcript).await.unwrap();

        assert_eq!(outcome.round_trips, 1);
        let request = &provider.requests()[0];
        assert_eq!(request.turns.len(), 3);
        assert_eq!(request.turns[0].text(), "How did Key West FC do?");
        assert_eq!(transcript.len(), 4);
    }

    #[tokio::test]
    async fn request_carries_prompt_tools_and_budgets() {
        let provider = Arc::new(SequentialMockProvider::new(vec![text_response("hi")]));
        let mut transcript = Transcript::with_question("q");

        AgentLoop::builder(provider.clone(), registry())
            .system_prompt("be brief")
            .model("m-1")
            .max_tokens(2000)
            .thinking_budget(Some(1024))
            .build()
            .run(&mut transcript)
            .await
            .unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.system, "be brief");
        assert_eq!(request.model, "m-1");
        assert_eq!(request.max_tokens, 2000);
        assert_eq!(request.thinking_budget, Some(1024));
        let names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["complete_task", "echo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_policy_wraps_the_provider() {
        let provider = Arc::new(SequentialMockProvider::with_results(vec![
            Err(ProviderError::RateLimited { retry_after_secs: 1 }),
            Ok(text_response("after the wait")),
        ]));
        let mut transcript = Transcript::with_question("q");

        let start = tokio::time::Instant::now();
        let outcome = AgentLoop::builder(provider.clone(), registry())
            .retry_policy(RetryPolicy::new(3, Duration::from_secs(1)))
            .build()
            .run(&mut transcript)
            .await
            .unwrap();

        assert_eq!(outcome.text, "after the wait");
        assert_eq!(outcome.round_trips, 1);
        assert_eq!(provider.call_count(), 2);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    struct ScriptedInput {
        messages: VecDeque<&'static str>,
        shown: Vec<String>,
        errors: Vec<String>,
    }

    #[async_trait]
    impl InputSource for ScriptedInput {
        fn show(&mut self, outcome: &AgentOutcome) {
            self.shown.push(outcome.text.clone());
        }

        fn report_error(&mut self, err: &Error) {
            self.errors.push(err.to_string());
        }

        async fn next_message(&mut self, _transcript: &Transcript) -> Option<String> {
            self.messages.pop_front().map(str::to_string)
        }
    }

    #[tokio::test]
    async fn interactive_session_survives_gateway_errors() {
        let provider = Arc::new(SequentialMockProvider::with_results(vec![
            Ok(text_response("Answer one")),
            Err(ProviderError::Network("reset".into())),
            Ok(text_response("Answer three")),
        ]));
        let mut input = ScriptedInput {
            messages: VecDeque::from(["second question", "  ", "third question"]),
            shown: Vec::new(),
            errors: Vec::new(),
        };
        let mut transcript = Transcript::with_question("first question");

        let outcome = agent(provider)
            .run_interactive(&mut transcript, &mut input)
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::InputClosed);
        assert_eq!(outcome.text, "Answer three");
        assert_eq!(outcome.round_trips, 2);
        assert_eq!(input.shown, vec!["Answer one", "Answer three"]);
        assert_eq!(input.errors.len(), 1);
        assert!(input.errors[0].contains("reset"));

        let texts: Vec<String> = transcript.turns().iter().map(Turn::text).collect();
        assert_eq!(
            texts,
            vec!["first question", "Answer one", "second question", "third question", "Answer three"]
        );
    }

    #[tokio::test]
    async fn interactive_session_waits_for_input_when_last_turn_is_assistant() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let mut input = ScriptedInput {
            messages: VecDeque::new(),
            shown: Vec::new(),
            errors: Vec::new(),
        };
        let mut transcript = Transcript::with_question("q");
        transcript.push(Turn::assistant(vec![ContentItem::text("a")]));

        let outcome = agent(provider.clone())
            .run_interactive(&mut transcript, &mut input)
            .await
            .unwrap();
        assert_eq!(outcome.termination, Termination::InputClosed);
        assert_eq!(provider.call_count(), 0);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn summary_prefers_reasoning_field() {
        assert_eq!(completion_summary(&serde_json::json!({"reasoning": "r", "other": "o"})), "r");
        assert_eq!(completion_summary(&serde_json::json!({"final": "f"})), "f");
        assert_eq!(completion_summary(&serde_json::json!({})), "");
    }
}
