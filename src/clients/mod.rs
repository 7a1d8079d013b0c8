//! History client implementations.

pub mod grpc;
pub mod local;
pub mod mock;
pub mod resilient;

pub use grpc::GrpcHistoryClient;
pub use local::LocalHistoryClient;
pub use mock::MockHistoryClient;
pub use resilient::ResilientHistoryClient;

use crate::config::HistoryClientConfig;
use crate::error::Result;

/// Build the production client stack from configuration: a lazily connected
/// gRPC client wrapped in the circuit breaker and retrier.
pub fn history_client_from_config(
    config: &HistoryClientConfig,
) -> Result<ResilientHistoryClient<GrpcHistoryClient>> {
    let grpc = GrpcHistoryClient::connect_lazy(&config.address)?
        .with_attempt_timeout(config.attempt_timeout());

    let client = ResilientHistoryClient::new(grpc, config.breaker_config(), config.retry_config());
    Ok(match config.call_timeout() {
        Some(timeout) => client.with_call_timeout(timeout),
        None => client,
    })
}
