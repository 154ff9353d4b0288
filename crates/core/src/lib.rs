//! # Pitchside Core
//!
//! Domain types, traits, and error definitions for the pitchside soccer-data
//! agent. Every other crate in the workspace depends inward on this one.
//!
//! - [`transcript`]: the append-only turn history that drives each model call
//! - [`provider`]: the Model Gateway trait and its request/response shapes
//! - [`tool`]: the `Tool` trait, the registry and the dispatcher
//! - [`error`]: one error enum per bounded context

pub mod error;
pub mod provider;
pub mod tool;
pub mod transcript;

pub use error::{Error, ProviderError, Result, StoreError, ToolError};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseBlock, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry};
pub use transcript::{ContentItem, Role, ToolCallRequest, ToolOutcome, Transcript, TranscriptId, Turn};
