//! Database schema definitions
//!
//! Account ids are stored as their bit pattern in SQLite's signed INTEGER.

/// SQL schema for the checkpoint database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    seed TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per expanded account, in expansion order
CREATE TABLE IF NOT EXISTS expansions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    account_id INTEGER NOT NULL,
    expanded_at TEXT NOT NULL,
    UNIQUE(run_id, account_id)
);

CREATE INDEX IF NOT EXISTS idx_expansions_run ON expansions(run_id);

-- Ranked top-K neighbors of each expansion
CREATE TABLE IF NOT EXISTS expansion_neighbors (
    expansion_id INTEGER NOT NULL REFERENCES expansions(id),
    rank INTEGER NOT NULL,
    neighbor_id INTEGER NOT NULL,
    PRIMARY KEY(expansion_id, rank)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["runs", "expansions", "expansion_neighbors"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
