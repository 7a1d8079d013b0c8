//! gRPC handler for `history.v1.History`.

use std::future::Future;
use std::sync::Arc;

use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::interfaces::AddRecordRequest;
use crate::proto::history_server::{History, HistoryServer};
use crate::proto;
use crate::services::HistoryService;

/// Adapts [`HistoryService`] to the generated service trait.
#[derive(Clone)]
pub struct HistoryGrpcHandler {
    service: Arc<HistoryService>,
}

impl HistoryGrpcHandler {
    pub fn new(service: Arc<HistoryService>) -> Self {
        Self { service }
    }

    pub fn into_server(self) -> HistoryServer<Self> {
        HistoryServer::new(self)
    }
}

#[tonic::async_trait]
impl History for HistoryGrpcHandler {
    async fn add_record(
        &self,
        request: Request<proto::AddRecordRequest>,
    ) -> Result<Response<proto::Record>, Status> {
        let req = AddRecordRequest::try_from(request.into_inner()).map_err(|e| {
            debug!(error = %e, "Rejected AddRecord request");
            Status::from(e)
        })?;

        let record = self.service.add_record(req).await?;
        Ok(Response::new(proto::Record::from(&record)))
    }
}

/// Tower trace layer opening one `grpc` span per request, tagged with the
/// method path.
pub fn grpc_trace_layer() -> TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::GrpcErrorsAsFailures>,
    impl Fn(&http::Request<tonic::body::BoxBody>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_grpc().make_span_with(|request: &http::Request<tonic::body::BoxBody>| {
        let path = request.uri().path();
        tracing::info_span!("grpc", %path)
    })
}

/// Serve the history gRPC service, plus the standard health service, on
/// `listener` until `shutdown` resolves.
pub async fn serve(
    service: Arc<HistoryService>,
    listener: tokio::net::TcpListener,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<(), tonic::transport::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "gRPC server listening");
    }

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<HistoryServer<HistoryGrpcHandler>>()
        .await;

    tonic::transport::Server::builder()
        .layer(grpc_trace_layer())
        .add_service(health_service)
        .add_service(HistoryGrpcHandler::new(service).into_server())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
}
