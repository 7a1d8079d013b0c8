//! geotracker-history: History service
//!
//! Stores movement records and answers distance queries.
//!
//! ## Architecture
//! ```text
//! [geotracker-record / location service] --(AddRecord gRPC)--> [geotracker-history] --> SQLite
//! [HTTP client] --(GET /v1/users/{username}/distance)--------> [geotracker-history]
//! ```
//!
//! ## Configuration
//! - `config.yaml` in the working directory, or the file named by GEOTRACKER_CONFIG
//! - GEOTRACKER__SERVER__HTTP_PORT / GEOTRACKER__SERVER__GRPC_PORT: listen ports
//! - GEOTRACKER__STORAGE__PATH: SQLite database file
//! - GEOTRACKER_LOG: log filter (default: info)

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

use geotracker::config::Config;
use geotracker::handlers;
use geotracker::services::HistoryService;
use geotracker::storage::init_storage;
use geotracker::utils::bootstrap::{init_tracing, shutdown_signal};

type BoxError = Box<dyn std::error::Error>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing();

    let config = Config::load(None)?;
    let (repository, users) = init_storage(&config.storage, &config.users).await?;
    let service = Arc::new(HistoryService::new(repository, users));

    let http_listener = TcpListener::bind(config.server.http_addr()).await?;
    let grpc_listener = TcpListener::bind(config.server.grpc_addr()).await?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut http_shutdown = shutdown_tx.subscribe();
    let mut grpc_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    info!(
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        "geotracker-history started"
    );

    let http = handlers::http::serve(Arc::clone(&service), http_listener, async move {
        let _ = http_shutdown.recv().await;
    });
    let grpc = handlers::grpc::serve(service, grpc_listener, async move {
        let _ = grpc_shutdown.recv().await;
    });

    tokio::try_join!(
        async { http.await.map_err(BoxError::from) },
        async { grpc.await.map_err(BoxError::from) },
    )?;

    info!("geotracker-history stopped");
    Ok(())
}
