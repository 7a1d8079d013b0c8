//! SQLite implementations of storage interfaces.

mod history_repository;
mod user_directory;

pub use history_repository::SqliteHistoryRepository;
pub use user_directory::SqliteUserDirectory;
