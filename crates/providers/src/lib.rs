//! Model gateway implementations for pitchside.
//!
//! All providers implement the `pitchside_core::Provider` trait.
//! [`RetryingProvider`] wraps any of them with the rate-limit backoff policy.

pub mod anthropic;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use retry::{Decision, RetryPolicy, RetryingProvider};
