//! Mock history client for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::{DomainError, Result};
use crate::interfaces::{AddRecordRequest, HistoryClient, Record};

/// Scriptable history client.
///
/// Each call consumes the next queued failure, if any; otherwise it fails
/// with the sticky failure, if set; otherwise it succeeds with a record
/// echoing the truncated request.
#[derive(Debug, Default)]
pub struct MockHistoryClient {
    script: Mutex<VecDeque<DomainError>>,
    fail_with: RwLock<Option<DomainError>>,
    delay: RwLock<Option<Duration>>,
    calls: AtomicU32,
    next_id: AtomicI64,
}

impl MockHistoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next unscripted call with `err`.
    pub async fn push_failure(&self, err: DomainError) {
        self.script.lock().await.push_back(err);
    }

    /// Fail every call (after the script is drained) with `err`.
    pub async fn set_fail_with(&self, err: Option<DomainError>) {
        *self.fail_with.write().await = err;
    }

    /// Sleep before answering each call.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    /// Number of times `add_record` reached this client.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryClient for MockHistoryClient {
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.script.lock().await.pop_front() {
            return Err(err);
        }

        if let Some(err) = self.fail_with.read().await.clone() {
            return Err(err);
        }

        let req = req.truncated();
        Ok(Record {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: req.user_id,
            a: req.a,
            b: req.b,
            timestamp: req.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;

    fn request() -> AddRecordRequest {
        AddRecordRequest::new(
            3,
            Point::new(10.123456789, 20.0),
            Point::new(10.2, 20.1),
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_mock_succeeds_by_default() {
        let client = MockHistoryClient::new();

        let first = client.add_record(request()).await.unwrap();
        let second = client.add_record(request()).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.a, Point::new(10.12345678, 20.0));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_script_then_sticky_failure() {
        let client = MockHistoryClient::new();
        client.push_failure(DomainError::invalid_argument("lat")).await;
        client
            .set_fail_with(Some(DomainError::internal("down")))
            .await;

        let first = client.add_record(request()).await.unwrap_err();
        let second = client.add_record(request()).await.unwrap_err();

        assert!(matches!(first, DomainError::InvalidArgument(_)));
        assert!(second.is_internal());

        client.set_fail_with(None).await;
        assert!(client.add_record(request()).await.is_ok());
        assert_eq!(client.call_count(), 3);
    }
}
