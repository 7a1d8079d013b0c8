//! Geotracker history service.
//!
//! Stores users' movement segments and answers "how far did this user
//! travel" queries. Writers reach the service through a
//! [`HistoryClient`](interfaces::HistoryClient); the production client
//! wraps gRPC in a circuit breaker and a retrier.
//!
//! Layout:
//! - `interfaces`: ports (client, repository, user directory) and record types
//! - `clients`: gRPC, in-process, mock and resilient history clients
//! - `services`: the history service
//! - `storage`: SQLite and in-memory repositories
//! - `handlers`: HTTP and gRPC inbound transports
//! - `utils`: bootstrap, circuit breaker, retrier

pub mod clients;
pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod interfaces;
pub mod proto;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{DomainError, Result};
