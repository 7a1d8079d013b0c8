//! Abstract interfaces for geotracker components.
//!
//! These traits define the contracts for:
//! - Remote history client (cross-service writes)
//! - Record repository (persistence and distance aggregation)
//! - User directory (username lookup)

pub mod history_client;
pub mod record;
pub mod repository;
pub mod user_directory;

pub use history_client::HistoryClient;
pub use record::{AddRecordRequest, DistanceQuery, Record, RecordId, UserId};
pub use repository::HistoryRepository;
pub use user_directory::{StaticUserDirectory, UserDirectory};
