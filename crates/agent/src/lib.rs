//! The pitchside agent loop.
//!
//! Each round trip:
//!
//! 1. **Send** the whole transcript, the system prompt and every tool
//!    definition to the model
//! 2. **If tool calls**: dispatch them in order, append one result per call,
//!    and loop back to step 1
//! 3. **If the completion tool was called**: stop without another model call
//! 4. **If text only**: return it (or, interactively, wait for the next
//!    user message)
//!
//! The loop always stops within `max_iterations` round trips.

pub mod context;
pub mod loop_runner;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{month_range, opening_message, schema_summary};
pub use loop_runner::{
    AgentLoop, AgentLoopBuilder, AgentOutcome, EMPTY_RESPONSE_PLACEHOLDER, InputSource,
    SKIPPED_AFTER_COMPLETION, Termination,
};
pub use prompt::SYSTEM_PROMPT;
