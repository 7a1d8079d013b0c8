//! Inbound transports.
//!
//! - `http`: axum distance API
//! - `grpc`: tonic AddRecord service

pub mod grpc;
pub mod http;

pub use grpc::HistoryGrpcHandler;
