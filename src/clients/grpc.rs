//! gRPC history client.

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::error::{self, DomainError, Result};
use crate::interfaces::{AddRecordRequest, HistoryClient, Record};
use crate::proto;
use crate::proto::history_client::HistoryClient as GrpcClient;

/// History client speaking `history.v1.History` over tonic.
///
/// Every failure is converted to a [`DomainError`]: status codes through
/// [`error::from_status`], transport failures and elapsed attempt timeouts
/// as `Internal`.
#[derive(Debug, Clone)]
pub struct GrpcHistoryClient {
    client: GrpcClient<Channel>,
    address: String,
    attempt_timeout: Option<Duration>,
}

impl GrpcHistoryClient {
    /// Create a client without dialing. The channel connects on first use,
    /// so an unreachable server shows up as a failed call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect_lazy(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        let endpoint = Endpoint::from_shared(address.clone()).map_err(|e| {
            DomainError::internal(format!("invalid history address {}: {}", address, e))
        })?;

        Ok(Self::from_channel(endpoint.connect_lazy(), address))
    }

    /// Create a client over an existing channel.
    pub fn from_channel(channel: Channel, address: impl Into<String>) -> Self {
        Self {
            client: GrpcClient::new(channel),
            address: address.into(),
            attempt_timeout: None,
        }
    }

    /// Bound each call. Sent to the server as the gRPC deadline and enforced
    /// locally.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl HistoryClient for GrpcHistoryClient {
    async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        let mut request = tonic::Request::new(proto::AddRecordRequest::from(&req));
        let mut client = self.client.clone();

        let response = match self.attempt_timeout {
            Some(timeout) => {
                request.set_timeout(timeout);
                tokio::time::timeout(timeout, client.add_record(request))
                    .await
                    .map_err(|_| {
                        DomainError::internal(format!(
                            "AddRecord to {} timed out after {:?}",
                            self.address, timeout
                        ))
                    })?
            }
            None => client.add_record(request).await,
        };

        let response = response.map_err(|status| {
            debug!(
                address = %self.address,
                code = ?status.code(),
                message = %status.message(),
                "AddRecord failed"
            );
            error::from_status(&status)
        })?;

        Record::try_from(response.into_inner())
    }
}
