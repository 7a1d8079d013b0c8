//! Wire types and the typed RPC client/server pair for `history.v1.History`.
//!
//! Mirrors what `tonic-build` emits for:
//!
//! ```proto
//! syntax = "proto3";
//! package history.v1;
//!
//! import "google/protobuf/timestamp.proto";
//!
//! message Point {
//!   double longitude = 1;
//!   double latitude = 2;
//! }
//!
//! message AddRecordRequest {
//!   int32 user_id = 1;
//!   Point a = 2;
//!   Point b = 3;
//!   google.protobuf.Timestamp timestamp = 4;
//! }
//!
//! message Record {
//!   int64 id = 1;
//!   int32 user_id = 2;
//!   Point a = 3;
//!   Point b = 4;
//!   google.protobuf.Timestamp timestamp = 5;
//! }
//!
//! service History {
//!   rpc AddRecord(AddRecordRequest) returns (Record);
//! }
//! ```
//!
//! Kept in source so the crate builds without `protoc`.

/// Geographic point on the wire.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Point {
    #[prost(double, tag = "1")]
    pub longitude: f64,
    #[prost(double, tag = "2")]
    pub latitude: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AddRecordRequest {
    #[prost(int32, tag = "1")]
    pub user_id: i32,
    #[prost(message, optional, tag = "2")]
    pub a: Option<Point>,
    #[prost(message, optional, tag = "3")]
    pub b: Option<Point>,
    #[prost(message, optional, tag = "4")]
    pub timestamp: Option<prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Record {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int32, tag = "2")]
    pub user_id: i32,
    #[prost(message, optional, tag = "3")]
    pub a: Option<Point>,
    #[prost(message, optional, tag = "4")]
    pub b: Option<Point>,
    #[prost(message, optional, tag = "5")]
    pub timestamp: Option<prost_types::Timestamp>,
}

/// Fully qualified service name.
pub const HISTORY_SERVICE_NAME: &str = "history.v1.History";

pub mod history_client {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::codegen::*;

    /// Typed client for `history.v1.History`.
    #[derive(Debug, Clone)]
    pub struct HistoryClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl HistoryClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> HistoryClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub async fn add_record(
            &mut self,
            request: impl tonic::IntoRequest<super::AddRecordRequest>,
        ) -> std::result::Result<tonic::Response<super::Record>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/history.v1.History/AddRecord");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new(super::HISTORY_SERVICE_NAME, "AddRecord"));
            self.inner.unary(req, path, codec).await
        }
    }
}

pub mod history_server {
    use tonic::codegen::*;

    /// Server-side handler for `history.v1.History`.
    #[async_trait::async_trait]
    pub trait History: Send + Sync + 'static {
        async fn add_record(
            &self,
            request: tonic::Request<super::AddRecordRequest>,
        ) -> std::result::Result<tonic::Response<super::Record>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct HistoryServer<T> {
        inner: Arc<T>,
    }

    impl<T> HistoryServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for HistoryServer<T>
    where
        T: History,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(
            &mut self,
            _cx: &mut Context<'_>,
        ) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/history.v1.History/AddRecord" => {
                    struct AddRecordSvc<T: History>(pub Arc<T>);

                    impl<T: History> tonic::server::UnaryService<super::AddRecordRequest> for AddRecordSvc<T> {
                        type Response = super::Record;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

                        fn call(
                            &mut self,
                            request: tonic::Request<super::AddRecordRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            let fut = async move { <T as History>::add_record(&inner, request).await };
                            Box::pin(fut)
                        }
                    }

                    let inner = Arc::clone(&self.inner);
                    let fut = async move {
                        let method = AddRecordSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    let mut response = http::Response::new(empty_body());
                    let headers = response.headers_mut();
                    // 12 = UNIMPLEMENTED
                    headers.insert("grpc-status", http::HeaderValue::from_static("12"));
                    headers.insert(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_static("application/grpc"),
                    );
                    Ok(response)
                }),
            }
        }
    }

    impl<T> Clone for HistoryServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<T> tonic::server::NamedService for HistoryServer<T> {
        const NAME: &'static str = super::HISTORY_SERVICE_NAME;
    }
}
