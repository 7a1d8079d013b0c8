//! In-process history client.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::interfaces::{AddRecordRequest, HistoryClient, Record};
use crate::services::HistoryService;

/// Calls a [`HistoryService`] in the same process.
///
/// Used when the writer and the history store are co-located.
#[derive(Clone)]
pub struct LocalHistoryClient {
    service: Arc<HistoryService>,
}

impl LocalHistoryClient {
    pub fn new(service: Arc<HistoryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl HistoryClient for LocalHistoryClient {
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        self.service.add_record(req).await
    }
}
