//! History client configuration types.

use std::time::Duration;

use serde::Deserialize;

use super::server::ConfigError;
use crate::utils::breaker::BreakerConfig;
use crate::utils::retry::RetryConfig;

/// Outbound history client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryClientConfig {
    /// gRPC address of the history service.
    pub address: String,
    /// Timeout for each individual attempt.
    pub attempt_timeout_ms: u64,
    /// Overall deadline for one call, retries included.
    pub call_timeout_ms: Option<u64>,
    pub breaker: BreakerSettings,
    pub retry: RetrySettings,
}

impl Default for HistoryClientConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:50051".to_string(),
            attempt_timeout_ms: 2000,
            call_timeout_ms: None,
            breaker: BreakerSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl HistoryClientConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        let b = &self.breaker;
        BreakerConfig {
            name: b.name.clone(),
            max_requests: b.max_requests,
            interval: Duration::from_millis(b.interval_ms),
            timeout: Duration::from_millis(b.timeout_ms),
            consecutive_failures: b.consecutive_failures,
            failure_ratio: b.failure_ratio,
            min_requests: b.min_requests,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            retries: self.retry.retries,
            delay: Duration::from_millis(self.retry.delay_ms),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "history_client.address must not be empty".to_string(),
            ));
        }
        let ratio = self.breaker.failure_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "history_client.breaker.failure_ratio must be in (0, 1], got {}",
                ratio
            )));
        }
        Ok(())
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub name: String,
    /// Trial calls allowed while half-open.
    pub max_requests: u32,
    /// Closed-state counting window; 0 never clears.
    pub interval_ms: u64,
    /// How long the breaker stays open.
    pub timeout_ms: u64,
    pub consecutive_failures: u32,
    pub failure_ratio: f64,
    pub min_requests: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        let defaults = BreakerConfig::default();
        Self {
            name: defaults.name,
            max_requests: defaults.max_requests,
            interval_ms: defaults.interval.as_millis() as u64,
            timeout_ms: defaults.timeout.as_millis() as u64,
            consecutive_failures: defaults.consecutive_failures,
            failure_ratio: defaults.failure_ratio,
            min_requests: defaults.min_requests,
        }
    }
}

/// Retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    pub retries: u32,
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            retries: defaults.retries,
            delay_ms: defaults.delay.as_millis() as u64,
        }
    }
}
