//! Domain services.

pub mod history;

pub use history::HistoryService;
