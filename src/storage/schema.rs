//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the snapshot store.

/// SQL schema for the snapshot database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    entry_count INTEGER NOT NULL DEFAULT 0
);

-- The current snapshot: entries in document order
CREATE TABLE IF NOT EXISTS entries (
    position INTEGER PRIMARY KEY,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    date TEXT NOT NULL,
    source_title TEXT NOT NULL
);

-- Images of each entry, per list, in thumbnail order
CREATE TABLE IF NOT EXISTS entry_images (
    entry_position INTEGER NOT NULL REFERENCES entries(position) ON DELETE CASCADE,
    role TEXT NOT NULL CHECK (role IN ('artwork', 'source')),
    ordinal INTEGER NOT NULL,
    src TEXT NOT NULL,
    alt TEXT NOT NULL,
    PRIMARY KEY (entry_position, role, ordinal)
);
"#;

/// Initializes the database schema
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

        for table in ["runs", "entries", "entry_images"] {
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

    #[test]
    fn test_image_role_is_constrained() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO entry_images (entry_position, role, ordinal, src, alt)
             VALUES (0, 'thumbnail', 0, 'a.png', '')",
            [],
        );
        assert!(result.is_err());
    }
}
