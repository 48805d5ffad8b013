//! Storage traits and error types

use crate::output::CrawlResult;
use crate::state::Frontier;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt line {line} in {file}")]
    CorruptLine { file: String, line: usize },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable session state
///
/// The result log is the durability boundary: `append_result` must have
/// reached the file before it returns.
pub trait Storage {
    // ===== Frontier =====

    /// Loads the visited / unvisited sets; missing files load as empty
    fn load_frontier(&self) -> StorageResult<Frontier>;

    /// Replaces the persisted visited / unvisited sets
    fn save_frontier(&mut self, frontier: &Frontier) -> StorageResult<()>;

    /// Removes the unvisited file, marking the session fully drained
    fn remove_unvisited(&mut self) -> StorageResult<()>;

    /// Returns true while an unvisited file exists
    fn has_unvisited(&self) -> bool;

    // ===== Results =====

    /// Appends one result to the append-only log
    fn append_result(&mut self, result: &CrawlResult) -> StorageResult<()>;

    /// Replays the result log in order
    ///
    /// Corrupt lines are logged and dropped; the rest are returned.
    fn load_results(&self) -> StorageResult<Vec<CrawlResult>>;

    /// Writes the consolidated result array
    fn consolidate_results(&mut self, results: &[CrawlResult]) -> StorageResult<()>;
}
