//! Record storage interface.

use async_trait::async_trait;

use super::record::{AddRecordRequest, DistanceQuery, Record};
use crate::error::Result;

/// Persists records and aggregates distance.
///
/// Implementations:
/// - `SqliteHistoryRepository`: SQLite storage
/// - `MockHistoryRepository`: in-memory storage for tests
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Insert a record. Out-of-range coordinates yield `InvalidArgument`;
    /// any other storage failure yields `Internal`.
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record>;

    /// Total great-circle distance in meters of the user's records within
    /// the inclusive window. Zero when nothing matches.
    async fn get_distance(&self, query: DistanceQuery) -> Result<f64>;
}
