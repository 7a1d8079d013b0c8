//! History service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{DomainError, Result};
use crate::interfaces::{AddRecordRequest, DistanceQuery, HistoryRepository, Record, UserDirectory};

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 64;

/// Records movement and answers distance queries.
///
/// Server side of AddRecord and the read side behind the HTTP API.
pub struct HistoryService {
    repository: Arc<dyn HistoryRepository>,
    users: Arc<dyn UserDirectory>,
}

impl HistoryService {
    pub fn new(repository: Arc<dyn HistoryRepository>, users: Arc<dyn UserDirectory>) -> Self {
        Self { repository, users }
    }

    /// Truncate both points to storage precision and persist the record.
    pub async fn add_record(&self, req: AddRecordRequest) -> Result<Record> {
        let req = req.truncated();
        let record = self.repository.add_record(req).await?;
        debug!(id = record.id, user_id = record.user_id, "Record added");
        Ok(record)
    }

    /// Total distance in meters travelled by `username` within the inclusive
    /// `[from, to]` window. Absent bounds are unconstrained.
    pub async fn get_distance_by_username(
        &self,
        username: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<f64> {
        validate_username(username)?;

        let user_id = self
            .users
            .resolve(username)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {username:?}")))?;

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::invalid_argument(format!(
                    "from ({from}) is after to ({to})"
                )));
            }
        }

        let distance = self
            .repository
            .get_distance(DistanceQuery { user_id, from, to })
            .await?;

        info!(username, user_id, distance, "Distance computed");
        Ok(distance)
    }
}

/// Usernames are 1 to [`MAX_USERNAME_LEN`] characters from `[A-Za-z0-9_.-]`.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(DomainError::invalid_argument("username is empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(DomainError::invalid_argument(format!(
            "username longer than {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .bytes()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'-'))
    {
        return Err(DomainError::invalid_argument(format!(
            "username {username:?} contains invalid characters"
        )));
    }
    Ok(())
}
