//! Remote client port for the history service.

use async_trait::async_trait;

use super::record::{AddRecordRequest, Record};
use crate::error::Result;

/// Capability every history transport must provide.
///
/// Implementations translate their native failures into
/// [`DomainError`](crate::error::DomainError) before returning, so
/// decorators stacked on top reason purely in domain terms.
///
/// Implementations:
/// - `GrpcHistoryClient`: tonic transport
/// - `LocalHistoryClient`: in-process call into a `HistoryService`
/// - `ResilientHistoryClient`: circuit breaker + retrier around another client
/// - `MockHistoryClient`: scripted test double
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// Store a displacement segment.
    ///
    /// Returns the record as accepted by the remote side, which may have
    /// adjusted coordinate precision.
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record>;
}
