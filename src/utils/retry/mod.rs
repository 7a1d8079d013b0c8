//! Fixed-delay retries for calls into a remote dependency.
//!
//! Only errors the classifier reports as unsuccessful (by default `Internal`)
//! are retried. Caller-fault errors come back after the first attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::{self, DomainError, Result, SuccessClassifier};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first (0 is treated as 1).
    pub retries: u32,
    /// Fixed wait between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(3),
        }
    }
}

impl RetryConfig {
    /// Effective number of attempts.
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }

    /// Check if another attempt should be made after `attempt` attempts.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }
}

/// Returns true when retrying should stop early.
pub type AbortHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// Re-invokes an operation while it fails with a retryable error.
#[derive(Clone)]
pub struct Retrier {
    config: RetryConfig,
    is_successful: SuccessClassifier,
    abort: Option<AbortHook>,
}

impl std::fmt::Debug for Retrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrier")
            .field("config", &self.config)
            .field("abort", &self.abort.is_some())
            .finish_non_exhaustive()
    }
}

impl Retrier {
    /// Create a retrier that retries only `Internal` errors.
    pub fn new(config: RetryConfig) -> Self {
        Self::with_classifier(config, Arc::new(error::is_successful))
    }

    /// Create a retrier with a custom success classifier.
    pub fn with_classifier(config: RetryConfig, is_successful: SuccessClassifier) -> Self {
        Self {
            config,
            is_successful,
            abort: None,
        }
    }

    /// Stop retrying (returning the last error) whenever `abort` returns true.
    ///
    /// Checked after each failed attempt, before waiting.
    pub fn with_abort(mut self, abort: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.abort = Some(Arc::new(abort));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute(None, op).await
    }

    /// Like [`Retrier::run`], bounded by `deadline`.
    ///
    /// No attempt starts at or after the deadline. An in-flight attempt is
    /// dropped when the deadline passes, and a delay that would end past it
    /// is not waited out. All of these surface as `Internal`.
    pub async fn run_until<T, F, Fut>(&self, deadline: Instant, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute(Some(deadline), op).await
    }

    async fn execute<T, F, Fut>(&self, deadline: Option<Instant>, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.config.attempts();
        let mut attempt = 0;

        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(deadline_exceeded(attempt));
            }
            attempt += 1;

            let outcome = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, op()).await {
                    Ok(outcome) => outcome,
                    Err(_) => return Err(deadline_exceeded(attempt)),
                },
                None => op().await,
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if (self.is_successful)(&err) {
                return Err(err);
            }

            if !self.config.should_retry(attempt) {
                warn!(attempts = attempt, error = %err, "giving up after final attempt");
                return Err(err);
            }

            if self.abort.as_ref().is_some_and(|abort| abort()) {
                warn!(attempts = attempt, error = %err, "retry aborted");
                return Err(err);
            }

            if let Some(deadline) = deadline {
                if Instant::now() + self.config.delay >= deadline {
                    return Err(deadline_exceeded(attempt));
                }
            }

            warn!(
                attempt,
                max,
                delay_ms = self.config.delay.as_millis() as u64,
                error = %err,
                "attempt failed, retrying"
            );
            tokio::time::sleep(self.config.delay).await;
        }
    }
}

fn deadline_exceeded(attempts: u32) -> DomainError {
    DomainError::internal(format!("deadline exceeded after {attempts} attempt(s)"))
}
