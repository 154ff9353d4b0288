//! Rate-limit retry policy for model gateway calls.
//!
//! Only the rate-limit error kind is retried. Each retry waits
//! `base_delay * 2^attempt` where `attempt` is the zero-based index of the
//! failed call. Everything else fails on the first occurrence.

use async_trait::async_trait;
use pitchside_config::RetrySettings;
use pitchside_core::error::ProviderError;
use pitchside_core::provider::{Provider, ProviderRequest, ProviderResponse};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Bounded exponential backoff on rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, Duration::from_secs(settings.base_delay_secs))
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait before retrying after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide what to do after attempt `attempt` (0-based) failed with `err`.
    pub fn decide(&self, attempt: u32, err: &ProviderError) -> Decision {
        if err.is_rate_limit() && attempt + 1 < self.max_attempts {
            Decision::Retry {
                delay: self.delay_for(attempt),
            }
        } else {
            Decision::Fail
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. A rate limit on the last attempt comes back as
    /// `ProviderError::RetriesExhausted`.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match self.decide(attempt, &err) {
                Decision::Retry { delay } => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Fail if err.is_rate_limit() => {
                    warn!(attempts = attempt + 1, "Rate limit retries exhausted");
                    return Err(ProviderError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(err),
                    });
                }
                Decision::Fail => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

/// A provider that applies a [`RetryPolicy`] around another provider.
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.policy
            .run(|| self.inner.complete(request.clone()))
            .await
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
