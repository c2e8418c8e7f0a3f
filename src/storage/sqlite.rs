//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::ExpansionSink;
use crate::graph::{AccountId, NetworkGraph};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::MutualsError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, seed, config_hash, status";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(MutualsError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, MutualsError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, MutualsError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn to_db_id(id: AccountId) -> i64 {
    id.0 as i64
}

fn from_db_id(raw: i64) -> AccountId {
    AccountId(raw as u64)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(RunRecord, String)> {
    let status: String = row.get(5)?;
    Ok((
        RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            seed: row.get(3)?,
            config_hash: row.get(4)?,
            status: RunStatus::Running,
        },
        status,
    ))
}

fn with_status((mut run, status): (RunRecord, String)) -> StorageResult<RunRecord> {
    run.status = RunStatus::from_db_string(&status).ok_or(StorageError::UnknownStatus(status))?;
    Ok(run)
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, seed: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, seed, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, seed, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;
        with_status(row)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?
            .map(with_status)
            .transpose()
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Expansions =====

    fn record_expansion(
        &mut self,
        run_id: i64,
        account: AccountId,
        neighbors: &[AccountId],
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO expansions (run_id, account_id, expanded_at) VALUES (?1, ?2, ?3)",
            params![run_id, to_db_id(account), now],
        )?;
        if inserted == 0 {
            tracing::debug!("Expansion of {} already recorded for run {}", account, run_id);
            return Ok(());
        }

        let expansion_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO expansion_neighbors (expansion_id, rank, neighbor_id) VALUES (?1, ?2, ?3)",
            )?;
            for (rank, neighbor) in neighbors.iter().enumerate() {
                stmt.execute(params![expansion_id, rank as i64, to_db_id(*neighbor)])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_expansions(&self, run_id: i64) -> StorageResult<NetworkGraph> {
        let mut stmt = self.conn.prepare(
            "SELECT e.account_id, n.neighbor_id
             FROM expansions e
             LEFT JOIN expansion_neighbors n ON n.expansion_id = e.id
             WHERE e.run_id = ?1
             ORDER BY e.id, n.rank",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
        })?;

        let mut entries: Vec<(AccountId, Vec<AccountId>)> = Vec::new();
        for row in rows {
            let (account, neighbor) = row?;
            let account = from_db_id(account);
            let neighbor = neighbor.map(from_db_id);
            match entries.last_mut() {
                Some((last, neighbors)) if *last == account => neighbors.extend(neighbor),
                _ => entries.push((account, neighbor.into_iter().collect())),
            }
        }

        let mut graph = NetworkGraph::new();
        for (account, neighbors) in entries {
            graph.insert(account, neighbors);
        }
        Ok(graph)
    }

    fn count_expansions(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM expansions WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Writes a crawler's expansions into one run
pub struct RunCheckpoint<'s, S: Storage + ?Sized> {
    storage: &'s mut S,
    run_id: i64,
}

impl<'s, S: Storage + ?Sized> RunCheckpoint<'s, S> {
    pub fn new(storage: &'s mut S, run_id: i64) -> Self {
        Self { storage, run_id }
    }
}

impl<S: Storage + ?Sized> ExpansionSink for RunCheckpoint<'_, S> {
    fn record_expansion(
        &mut self,
        account: AccountId,
        neighbors: &[AccountId],
    ) -> Result<(), MutualsError> {
        self.storage
            .record_expansion(self.run_id, account, neighbors)?;
        Ok(())
    }
}
