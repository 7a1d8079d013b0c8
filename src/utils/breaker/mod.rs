//! Circuit breaker for calls into a remote dependency.
//!
//! # States
//! - Closed: calls pass through; outcomes are counted per generation
//! - Open: calls fail fast with `Internal` without reaching the dependency
//! - HalfOpen: a limited number of trial calls probe the dependency
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     trip policy satisfied by the current window's counts
//! Open     → HalfOpen: after `timeout`
//! HalfOpen → Closed:   a trial succeeds
//! HalfOpen → Open:     a trial fails
//! ```
//!
//! Every transition (and every elapsed Closed `interval`) starts a new
//! generation with cleared counts. Outcomes of calls admitted in an older
//! generation are discarded.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{self, DomainError, Result, SuccessClassifier};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        };
        f.write_str(s)
    }
}

/// Request and outcome counters for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    fn on_cancel(&mut self) {
        self.requests = self.requests.saturating_sub(1);
    }

    fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }
}

/// Breaker settings.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Name used in logs and rejection messages.
    pub name: String,
    /// Maximum in-flight trial calls while HalfOpen (0 is treated as 1).
    pub max_requests: u32,
    /// Closed-state window after which counts are cleared. Zero never clears.
    pub interval: Duration,
    /// How long the breaker stays Open before allowing trials.
    pub timeout: Duration,
    /// Trip when consecutive failures exceed this.
    pub consecutive_failures: u32,
    /// Trip when the failure ratio reaches this, once `min_requests` is met.
    pub failure_ratio: f64,
    /// Volume required before the ratio is considered.
    pub min_requests: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "historyclient".to_string(),
            max_requests: 3,
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(7),
            consecutive_failures: 5,
            failure_ratio: 0.6,
            min_requests: 10,
        }
    }
}

impl BreakerConfig {
    /// Trip policy evaluated after each failure in Closed state.
    pub fn ready_to_trip(&self, counts: &Counts) -> bool {
        if counts.consecutive_failures > self.consecutive_failures {
            return true;
        }

        counts.requests > 0
            && counts.requests >= self.min_requests
            && f64::from(counts.total_failures) / f64::from(counts.requests) >= self.failure_ratio
    }

    fn half_open_budget(&self) -> u32 {
        self.max_requests.max(1)
    }
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    generation: u64,
    counts: Counts,
    expiry: Option<Instant>,
}

/// Circuit breaker shared by every call made through one instance.
///
/// All reads and transitions happen under a single lock; the wrapped call
/// itself runs without holding it.
pub struct CircuitBreaker {
    config: BreakerConfig,
    is_successful: SuccessClassifier,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Create a breaker that counts only `Internal` errors as failures.
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_classifier(config, Arc::new(error::is_successful))
    }

    /// Create a breaker with a custom success classifier.
    pub fn with_classifier(config: BreakerConfig, is_successful: SuccessClassifier) -> Self {
        let now = Instant::now();
        let expiry = closed_expiry(&config, now);
        Self {
            config,
            is_successful,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state, applying any elapsed timeout or interval first.
    pub fn state(&self) -> BreakerState {
        let mut inner = self.lock();
        self.current_state(&mut inner, Instant::now());
        inner.state
    }

    pub fn is_open(&self) -> bool {
        self.state() == BreakerState::Open
    }

    /// Counters of the current generation.
    pub fn counts(&self) -> Counts {
        let mut inner = self.lock();
        self.current_state(&mut inner, Instant::now());
        inner.counts
    }

    /// Run `f` through the breaker.
    ///
    /// When the breaker rejects, `f` is never invoked and `Internal` is
    /// returned. Dropping the returned future before completion releases
    /// the admission without recording an outcome.
    pub async fn call<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let generation = self.before_request()?;
        let mut guard = Admission {
            breaker: self,
            generation,
            settled: false,
        };

        let result = f().await;

        let success = match &result {
            Ok(_) => true,
            Err(e) => (self.is_successful)(e),
        };
        guard.settled = true;
        self.after_request(generation, success);

        result
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn before_request(&self) -> Result<u64> {
        let mut inner = self.lock();
        let generation = self.current_state(&mut inner, Instant::now());

        match inner.state {
            BreakerState::Open => {
                return Err(DomainError::internal(format!(
                    "circuit breaker {} is open",
                    self.config.name
                )));
            }
            BreakerState::HalfOpen if inner.counts.requests >= self.config.half_open_budget() => {
                return Err(DomainError::internal(format!(
                    "circuit breaker {} is half-open and out of trial calls",
                    self.config.name
                )));
            }
            _ => {}
        }

        inner.counts.on_request();
        Ok(generation)
    }

    fn after_request(&self, before: u64, success: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        let generation = self.current_state(&mut inner, now);
        if generation != before {
            return;
        }

        if success {
            self.on_success(&mut inner, now);
        } else {
            self.on_failure(&mut inner, now);
        }
    }

    fn release(&self, before: u64) {
        let mut inner = self.lock();
        let generation = self.current_state(&mut inner, Instant::now());
        if generation == before {
            inner.counts.on_cancel();
        }
    }

    fn on_success(&self, inner: &mut Inner, now: Instant) {
        match inner.state {
            BreakerState::Closed => inner.counts.on_success(),
            BreakerState::HalfOpen => self.set_state(inner, BreakerState::Closed, now),
            BreakerState::Open => {}
        }
    }

    fn on_failure(&self, inner: &mut Inner, now: Instant) {
        match inner.state {
            BreakerState::Closed => {
                inner.counts.on_failure();
                if self.config.ready_to_trip(&inner.counts) {
                    self.set_state(inner, BreakerState::Open, now);
                }
            }
            BreakerState::HalfOpen => self.set_state(inner, BreakerState::Open, now),
            BreakerState::Open => {}
        }
    }

    /// Applies elapsed expiries and returns the current generation.
    fn current_state(&self, inner: &mut Inner, now: Instant) -> u64 {
        match inner.state {
            BreakerState::Closed => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.new_generation(inner, now);
                }
            }
            BreakerState::Open => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.set_state(inner, BreakerState::HalfOpen, now);
                }
            }
            BreakerState::HalfOpen => {}
        }
        inner.generation
    }

    fn set_state(&self, inner: &mut Inner, state: BreakerState, now: Instant) {
        if inner.state == state {
            return;
        }

        let prev = inner.state;
        inner.state = state;
        let counts = inner.counts;
        self.new_generation(inner, now);

        match state {
            BreakerState::Open => warn!(
                breaker = %self.config.name,
                from = %prev,
                requests = counts.requests,
                failures = counts.total_failures,
                consecutive_failures = counts.consecutive_failures,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "circuit breaker opened"
            ),
            _ => info!(
                breaker = %self.config.name,
                from = %prev,
                to = %state,
                "circuit breaker state changed"
            ),
        }
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation = inner.generation.wrapping_add(1);
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            BreakerState::Closed => closed_expiry(&self.config, now),
            BreakerState::Open => Some(now + self.config.timeout),
            BreakerState::HalfOpen => None,
        };
    }
}

fn closed_expiry(config: &BreakerConfig, now: Instant) -> Option<Instant> {
    if config.interval.is_zero() {
        None
    } else {
        Some(now + config.interval)
    }
}

/// Releases an admission whose call was dropped before completing.
struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}
