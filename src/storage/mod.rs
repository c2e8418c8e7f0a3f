//! Storage module for checkpointing crawl progress
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking and resumption support
//! - Per-account expansion checkpoints

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{RunCheckpoint, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::OutputConfig;
use crate::MutualsError;

use std::path::Path;

/// Opens the checkpoint database named by the output configuration
pub fn open_storage(output: &OutputConfig) -> Result<SqliteStorage, MutualsError> {
    tracing::debug!("Opening checkpoint database {}", output.database_path);
    SqliteStorage::new(Path::new(&output.database_path))
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub seed: String,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether a run in this status can be picked up again
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::Running | Self::Interrupted)
    }
}
