//! Storage implementations.

use std::sync::Arc;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{error, info};

use crate::config::{StorageConfig, UserEntry};
use crate::error::DomainError;
use crate::interfaces::{HistoryRepository, UserDirectory};
use schema::COORDINATE_CONSTRAINTS;

pub mod mock;
pub mod schema;
pub mod sqlite;

pub use mock::MockHistoryRepository;
pub use sqlite::{SqliteHistoryRepository, SqliteUserDirectory};

/// Storage-layer failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Name of the violated coordinate check constraint, if that is what
    /// this error is.
    pub fn violated_coordinate_constraint(&self) -> Option<&'static str> {
        let StorageError::Database(sqlx::Error::Database(db)) = self else {
            return None;
        };
        if !matches!(db.kind(), sqlx::error::ErrorKind::CheckViolation) {
            return None;
        }

        let message = db.message();
        COORDINATE_CONSTRAINTS
            .iter()
            .copied()
            .find(|name| message.contains(name))
    }
}

/// Coordinate constraint violations are the caller's fault; everything else
/// is internal. The cause is logged here and not carried further.
impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        if let Some(constraint) = err.violated_coordinate_constraint() {
            return DomainError::invalid_argument(format!("coordinate out of range ({constraint})"));
        }

        error!(error = %err, "Storage failure");
        DomainError::internal(format!("storage: {}", err))
    }
}

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Open a SQLite pool at `path`, creating the file and its parent directory
/// if needed. [`IN_MEMORY`] opens a single-connection in-memory database.
pub async fn connect(path: &str) -> Result<SqlitePool, StorageError> {
    if path == IN_MEMORY {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        return Ok(pool);
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path)).await?)
}

/// Initialize storage based on configuration.
///
/// Creates the schema and seeds the user table. Returns tuple of
/// (HistoryRepository, UserDirectory) implementations sharing one pool.
pub async fn init_storage(
    config: &StorageConfig,
    users: &[UserEntry],
) -> Result<(Arc<dyn HistoryRepository>, Arc<dyn UserDirectory>), Box<dyn std::error::Error>> {
    info!("Storage: sqlite at {}", config.path);

    let pool = connect(&config.path).await?;

    let repository = SqliteHistoryRepository::new(pool.clone());
    repository.init().await?;

    let directory = SqliteUserDirectory::new(pool);
    directory.init().await?;
    directory
        .seed(users.iter().map(|u| (u.id, u.username.as_str())))
        .await?;
    info!("Seeded {} user(s)", users.len());

    Ok((Arc::new(repository), Arc::new(directory)))
}
