//! Circuit breaker and retrier stacked around a history client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::warn;

use crate::error::Result;
use crate::interfaces::{AddRecordRequest, HistoryClient, Record};
use crate::utils::breaker::{BreakerConfig, BreakerState, CircuitBreaker};
use crate::utils::retry::{Retrier, RetryConfig};

/// History client that retries transient failures behind a circuit breaker.
///
/// The retrier is outermost in time and the breaker wraps each individual
/// attempt, so every retry is admitted (or rejected) by the breaker and
/// counts toward its statistics. Retrying stops early once the breaker is
/// open.
///
/// Callers see the same [`HistoryClient`] contract as the wrapped client.
pub struct ResilientHistoryClient<C> {
    inner: C,
    breaker: Arc<CircuitBreaker>,
    retrier: Retrier,
    call_timeout: Option<Duration>,
}

impl<C: HistoryClient> ResilientHistoryClient<C> {
    pub fn new(inner: C, breaker: BreakerConfig, retry: RetryConfig) -> Self {
        Self::with_breaker(inner, Arc::new(CircuitBreaker::new(breaker)), retry)
    }

    /// Wrap `inner` with an existing (possibly shared) breaker.
    pub fn with_breaker(inner: C, breaker: Arc<CircuitBreaker>, retry: RetryConfig) -> Self {
        let watched = Arc::clone(&breaker);
        let retrier = Retrier::new(retry).with_abort(move || watched.is_open());

        Self {
            inner,
            breaker,
            retrier,
            call_timeout: None,
        }
    }

    /// Bound the whole call, retries and delays included.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: HistoryClient> HistoryClient for ResilientHistoryClient<C> {
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        let inner = &self.inner;
        let breaker = &self.breaker;
        let req = &req;
        let attempt = move || breaker.call(move || inner.add_record(req.clone()));

        let result = match self.call_timeout {
            Some(timeout) => self.retrier.run_until(Instant::now() + timeout, attempt).await,
            None => self.retrier.run(attempt).await,
        };

        if let Err(e) = &result {
            if e.is_internal() {
                warn!(
                    breaker = %self.breaker.name(),
                    state = %self.breaker.state(),
                    user_id = req.user_id,
                    error = %e,
                    "AddRecord failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockHistoryClient;
    use crate::error::DomainError;
    use crate::geo::Point;

    fn request() -> AddRecordRequest {
        AddRecordRequest::new(
            1,
            Point::new(37.6, 55.7),
            Point::new(37.61, 55.71),
            chrono::Utc::now(),
        )
    }

    fn retry(retries: u32) -> RetryConfig {
        RetryConfig {
            retries,
            delay: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_success_through() {
        let client = ResilientHistoryClient::new(
            MockHistoryClient::new(),
            BreakerConfig::default(),
            retry(3),
        );

        let record = client.add_record(request()).await.unwrap();

        assert_eq!(record.user_id, 1);
        assert_eq!(client.inner().call_count(), 1);
        assert_eq!(client.breaker().counts().total_successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_goes_through_breaker() {
        let client = ResilientHistoryClient::new(
            MockHistoryClient::new(),
            BreakerConfig::default(),
            retry(3),
        );
        client
            .inner()
            .set_fail_with(Some(DomainError::internal("down")))
            .await;

        let err = client.add_record(request()).await.unwrap_err();

        assert!(err.is_internal());
        assert_eq!(client.inner().call_count(), 3);
        let counts = client.breaker().counts();
        assert_eq!(counts.requests, 3);
        assert_eq!(counts.consecutive_failures, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_retrying_once_breaker_opens() {
        let breaker = BreakerConfig {
            consecutive_failures: 1,
            ..BreakerConfig::default()
        };
        let client = ResilientHistoryClient::new(MockHistoryClient::new(), breaker, retry(5));
        client
            .inner()
            .set_fail_with(Some(DomainError::internal("down")))
            .await;

        let err = client.add_record(request()).await.unwrap_err();

        assert!(err.is_internal());
        assert_eq!(client.inner().call_count(), 2);
        assert_eq!(client.breaker_state(), BreakerState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_fault_returned_after_one_attempt() {
        let client = ResilientHistoryClient::new(
            MockHistoryClient::new(),
            BreakerConfig::default(),
            retry(3),
        );
        client
            .inner()
            .set_fail_with(Some(DomainError::invalid_argument("latitude")))
            .await;

        let err = client.add_record(request()).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert_eq!(client.inner().call_count(), 1);
        assert_eq!(client.breaker().counts().consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_is_internal() {
        let client = ResilientHistoryClient::new(
            MockHistoryClient::new(),
            BreakerConfig::default(),
            retry(3),
        )
        .with_call_timeout(Duration::from_millis(150));
        client
            .inner()
            .set_fail_with(Some(DomainError::internal("down")))
            .await;

        let err = client.add_record(request()).await.unwrap_err();

        // The second attempt would start after 100ms, the third after 200ms.
        assert!(err.is_internal());
        assert_eq!(client.inner().call_count(), 2);
    }
}
