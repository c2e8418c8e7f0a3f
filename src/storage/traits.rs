//! Storage trait definitions
//!
//! This module defines the abstract storage interface for crawl checkpoints.

use crate::graph::{AccountId, NetworkGraph};
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Unknown run status: {0}")]
    UnknownStatus(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backends
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run and returns its id
    fn create_run(&mut self, seed: &str, config_hash: &str) -> StorageResult<i64>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run, if any
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run completed and stamps its finish time
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Expansions =====

    /// Records the ranked neighbors of `account`
    ///
    /// The first record for an account wins; later ones are ignored.
    fn record_expansion(
        &mut self,
        run_id: i64,
        account: AccountId,
        neighbors: &[AccountId],
    ) -> StorageResult<()>;

    /// Loads every expansion of a run, in the order they were recorded
    fn load_expansions(&self, run_id: i64) -> StorageResult<NetworkGraph>;

    fn count_expansions(&self, run_id: i64) -> StorageResult<u64>;
}
