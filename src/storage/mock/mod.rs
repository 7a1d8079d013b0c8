//! Mock storage implementations for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{DomainError, Result};
use crate::interfaces::{AddRecordRequest, DistanceQuery, HistoryRepository, Record};

/// In-memory repository enforcing the same coordinate ranges as SQLite.
#[derive(Default)]
pub struct MockHistoryRepository {
    records: RwLock<Vec<Record>>,
    fail_on_add: RwLock<bool>,
    fail_on_get: RwLock<bool>,
}

impl MockHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_add(&self, fail: bool) {
        *self.fail_on_add.write().await = fail;
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    /// Snapshot of stored records in insertion order.
    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.clone()
    }
}

fn in_range(value: f64, limit: f64) -> bool {
    (-limit..=limit).contains(&value)
}

#[async_trait]
impl HistoryRepository for MockHistoryRepository {
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        if *self.fail_on_add.read().await {
            return Err(DomainError::internal("mock add failure"));
        }

        for point in [&req.a, &req.b] {
            if !in_range(point.longitude, 180.0) || !in_range(point.latitude, 90.0) {
                return Err(DomainError::invalid_argument(format!(
                    "coordinate out of range {point}"
                )));
            }
        }

        let mut records = self.records.write().await;
        let record = Record {
            id: records.len() as i64 + 1,
            user_id: req.user_id,
            a: req.a,
            b: req.b,
            timestamp: req.timestamp,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn get_distance(&self, query: DistanceQuery) -> Result<f64> {
        if *self.fail_on_get.read().await {
            return Err(DomainError::internal("mock get failure"));
        }

        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == query.user_id)
            .filter(|r| query.from.map_or(true, |from| r.timestamp >= from))
            .filter(|r| query.to.map_or(true, |to| r.timestamp <= to))
            .map(Record::distance)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_mock_rejects_out_of_range() {
        let repo = MockHistoryRepository::new();
        let req = AddRecordRequest::new(
            1,
            Point::new(0.0, 91.0),
            Point::new(0.0, 0.0),
            Utc::now(),
        );
        assert!(matches!(
            repo.add_record(req).await,
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(repo.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_mock_window_is_inclusive() {
        let repo = MockHistoryRepository::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        repo.add_record(AddRecordRequest::new(
            1,
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.001),
            t,
        ))
        .await
        .unwrap();

        let distance = repo
            .get_distance(DistanceQuery {
                user_id: 1,
                from: Some(t),
                to: Some(t),
            })
            .await
            .unwrap();
        assert!(distance > 0.0);
    }

    #[test]
    fn test_mock_fail_flags() {
        let repo = MockHistoryRepository::new();
        let req = AddRecordRequest::new(1, Point::new(0.0, 0.0), Point::new(0.0, 0.0), Utc::now());

        tokio_test::block_on(async {
            tokio_test::assert_ok!(repo.add_record(req.clone()).await);
            repo.set_fail_on_add(true).await;
            tokio_test::assert_err!(repo.add_record(req).await);
        });
    }
}
