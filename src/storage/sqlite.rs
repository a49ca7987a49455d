//! SQLite snapshot store
//!
//! Holds the entries of the most recent run that got past extraction, plus a
//! history of every run. Each entry is committed in its own transaction, so an
//! interrupted run still leaves every completed entry readable.

use crate::model::{GalleryEntry, ImageRef};
use crate::state::RunState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PersistenceError, PersistenceResult};
use crate::storage::RunRecord;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;

const ROLE_ARTWORK: &str = "artwork";
const ROLE_SOURCE: &str = "source";

/// SQLite snapshot backend
pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Opens (or creates) the snapshot database at `path`
    pub fn open(path: &Path) -> PersistenceResult<Self> {
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

    /// Opens an existing snapshot without writing to it
    ///
    /// No pragmas are set and no schema is created, so a file that is not a
    /// snapshot fails on first query instead of being converted into one.
    pub fn open_read_only(path: &Path) -> PersistenceResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Creates an in-memory store
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Run Management =====

    /// Records the start of a run
    pub fn create_run(&mut self, config_hash: &str) -> PersistenceResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunState::Start.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Records the terminal state of a run
    pub fn finish_run(
        &mut self,
        run_id: i64,
        state: RunState,
        entry_count: usize,
    ) -> PersistenceResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, entry_count = ?3 WHERE id = ?4",
            params![state.to_db_string(), now, entry_count as i64, run_id],
        )?;
        if updated == 0 {
            return Err(PersistenceError::RunNotFound(run_id));
        }
        Ok(())
    }

    pub fn get_run(&self, run_id: i64) -> PersistenceResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, entry_count
                 FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(PersistenceError::RunNotFound(run_id))
    }

    /// The most recent run, if any
    pub fn latest_run(&self) -> PersistenceResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, entry_count
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    /// Every recorded run, oldest first
    pub fn list_runs(&self) -> PersistenceResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status, entry_count
             FROM runs ORDER BY id",
        )?;
        let runs = stmt
            .query_map([], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Snapshot =====

    /// Discards the previous snapshot so `run_id` can write a new one
    ///
    /// Nothing is cleared unless `run_id` is a recorded run.
    pub fn begin_snapshot(&mut self, run_id: i64) -> PersistenceResult<()> {
        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![RunState::BuildingEntry.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(PersistenceError::RunNotFound(run_id));
        }
        tx.execute("DELETE FROM entry_images", [])?;
        let cleared = tx.execute("DELETE FROM entries", [])?;
        tx.commit()?;

        tracing::debug!("Cleared {} entries of the previous snapshot", cleared);
        Ok(())
    }

    /// Appends one entry at `position` in a single transaction
    pub fn append_entry(
        &mut self,
        run_id: i64,
        position: usize,
        entry: &GalleryEntry,
    ) -> PersistenceResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO entries (position, run_id, date, source_title) VALUES (?1, ?2, ?3, ?4)",
            params![position as i64, run_id, entry.date, entry.source_title],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO entry_images (entry_position, role, ordinal, src, alt)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (role, images) in [
                (ROLE_ARTWORK, &entry.artworks),
                (ROLE_SOURCE, &entry.source_images),
            ] {
                for (ordinal, image) in images.iter().enumerate() {
                    stmt.execute(params![
                        position as i64,
                        role,
                        ordinal as i64,
                        image.source_url(),
                        image.alt_text()
                    ])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Removes the entry at `position` and its images
    pub fn remove_entry(&mut self, position: usize) -> PersistenceResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM entry_images WHERE entry_position = ?1",
            params![position as i64],
        )?;
        tx.execute(
            "DELETE FROM entries WHERE position = ?1",
            params![position as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Loads the snapshot in document order
    pub fn load_entries(&self) -> PersistenceResult<Vec<GalleryEntry>> {
        let mut entry_stmt = self
            .conn
            .prepare("SELECT position, date, source_title FROM entries ORDER BY position")?;
        let mut image_stmt = self.conn.prepare(
            "SELECT role, src, alt FROM entry_images WHERE entry_position = ?1 ORDER BY ordinal",
        )?;

        let rows = entry_stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (position, date, source_title) in rows {
            let mut entry = GalleryEntry::new(vec![], date, source_title, vec![]);

            let images = image_stmt.query_map(params![position], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    ImageRef::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
                ))
            })?;

            for image in images {
                let (role, image) = image?;
                match role.as_str() {
                    ROLE_ARTWORK => entry.artworks.push(image),
                    ROLE_SOURCE => entry.source_images.push(image),
                    other => {
                        return Err(PersistenceError::Corrupt(format!(
                            "unknown image role '{}' at entry {}",
                            other, position
                        )))
                    }
                }
            }

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Number of entries in the snapshot
    pub fn count_entries(&self) -> PersistenceResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(4)?;
    let status = RunState::from_db_string(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown run status '{}'", status).into(),
        )
    })?;

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status,
        entry_count: row.get::<_, i64>(5)? as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(title: &str, artworks: &[(&str, &str)], sources: &[(&str, &str)]) -> GalleryEntry {
        GalleryEntry::new(
            artworks.iter().map(|(s, a)| ImageRef::new(*s, *a)).collect(),
            "2023",
            title,
            sources.iter().map(|(s, a)| ImageRef::new(*s, *a)).collect(),
        )
    }

    #[test]
    fn test_create_and_finish_run() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let run_id = store.create_run("abc123").unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunState::Start);
        assert_eq!(run.config_hash, "abc123");
        assert!(run.finished_at.is_none());

        store.finish_run(run_id, RunState::Done, 3).unwrap();
        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunState::Done);
        assert_eq!(run.entry_count, 3);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_unknown_run() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get_run(42),
            Err(PersistenceError::RunNotFound(42))
        ));
        assert!(matches!(
            store.finish_run(42, RunState::Done, 0),
            Err(PersistenceError::RunNotFound(42))
        ));
    }

    #[test]
    fn test_latest_and_list_runs() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        assert!(store.latest_run().unwrap().is_none());

        let first = store.create_run("h").unwrap();
        let second = store.create_run("h").unwrap();
        store
            .finish_run(first, RunState::AbortedFetchFailure, 0)
            .unwrap();

        assert_eq!(store.latest_run().unwrap().unwrap().id, second);
        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].status, RunState::AbortedFetchFailure);
    }

    #[test]
    fn test_snapshot_preserves_order_and_lists() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let run_id = store.create_run("h").unwrap();
        store.begin_snapshot(run_id).unwrap();

        let entries = vec![
            entry("First", &[("a.png", "A"), ("b.png", "B")], &[("s.png", "S")]),
            entry("Second", &[], &[]),
            entry("Third", &[("c.png", "")], &[("t1.png", "1"), ("t2.png", "2")]),
        ];
        for (position, e) in entries.iter().enumerate() {
            store.append_entry(run_id, position, e).unwrap();
        }

        assert_eq!(store.load_entries().unwrap(), entries);
        assert_eq!(store.count_entries().unwrap(), 3);
    }

    #[test]
    fn test_begin_snapshot_replaces_previous() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let old_run = store.create_run("h").unwrap();
        store.begin_snapshot(old_run).unwrap();
        store
            .append_entry(old_run, 0, &entry("Old", &[("o.png", "O")], &[]))
            .unwrap();

        let new_run = store.create_run("h").unwrap();
        store.begin_snapshot(new_run).unwrap();
        assert!(store.load_entries().unwrap().is_empty());

        store
            .append_entry(new_run, 0, &entry("New", &[], &[]))
            .unwrap();
        assert_eq!(store.load_entries().unwrap(), vec![entry("New", &[], &[])]);
        assert_eq!(
            store.get_run(new_run).unwrap().status,
            RunState::BuildingEntry
        );
    }

    #[test]
    fn test_duplicate_position_rolls_back() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let run_id = store.create_run("h").unwrap();
        store.begin_snapshot(run_id).unwrap();
        store
            .append_entry(run_id, 0, &entry("First", &[("a.png", "A")], &[]))
            .unwrap();

        let result = store.append_entry(run_id, 0, &entry("Clash", &[("x.png", "X")], &[]));
        assert!(matches!(result, Err(PersistenceError::Sqlite(_))));
        assert_eq!(
            store.load_entries().unwrap(),
            vec![entry("First", &[("a.png", "A")], &[])]
        );
    }

    #[test]
    fn test_unknown_run_status_is_reported() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let run_id = store.create_run("h").unwrap();
        store
            .connection()
            .execute(
                "UPDATE runs SET status = 'half_done' WHERE id = ?1",
                params![run_id],
            )
            .unwrap();

        assert!(matches!(
            store.get_run(run_id),
            Err(PersistenceError::Sqlite(
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, _)
            ))
        ));
        assert!(store.list_runs().is_err());
        assert!(store.latest_run().is_err());
    }

    #[test]
    fn test_begin_snapshot_for_unknown_run_keeps_snapshot() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let run_id = store.create_run("h").unwrap();
        store.begin_snapshot(run_id).unwrap();
        let kept = entry("Kept", &[("k.png", "K")], &[]);
        store.append_entry(run_id, 0, &kept).unwrap();

        assert!(matches!(
            store.begin_snapshot(run_id + 1),
            Err(PersistenceError::RunNotFound(_))
        ));
        assert_eq!(store.load_entries().unwrap(), vec![kept]);
    }

    #[test]
    fn test_remove_entry_drops_its_images() {
        let mut store = SnapshotStore::open_in_memory().unwrap();
        let run_id = store.create_run("h").unwrap();
        store.begin_snapshot(run_id).unwrap();
        let first = entry("First", &[("a.png", "A")], &[]);
        store.append_entry(run_id, 0, &first).unwrap();
        store
            .append_entry(run_id, 1, &entry("Second", &[("b.png", "B")], &[("s.png", "S")]))
            .unwrap();

        store.remove_entry(1).unwrap();

        assert_eq!(store.load_entries().unwrap(), vec![first]);
        let images: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM entry_images", [], |row| row.get(0))
            .unwrap();
        assert_eq!(images, 1);
    }

    #[test]
    fn test_read_only_open_leaves_foreign_database_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE notes (body TEXT);").unwrap();
        }

        let store = SnapshotStore::open_read_only(&path).unwrap();
        assert!(matches!(
            store.load_entries(),
            Err(PersistenceError::Sqlite(_))
        ));
        drop(store);

        let conn = Connection::open(&path).unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["notes".to_string()]);
        let journal: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal, "delete");
    }

    #[test]
    fn test_read_only_open_of_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        assert!(SnapshotStore::open_read_only(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.db");
        let saved = entry("Persisted", &[("a.png", "A")], &[("s.png", "")]);

        {
            let mut store = SnapshotStore::open(&path).unwrap();
            let run_id = store.create_run("h").unwrap();
            store.begin_snapshot(run_id).unwrap();
            store.append_entry(run_id, 0, &saved).unwrap();
        }

        let store = SnapshotStore::open(&path).unwrap();
        assert_eq!(store.load_entries().unwrap(), vec![saved]);
    }
}
