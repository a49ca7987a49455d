//! Storage module for persisting gallery entries
//!
//! This module handles both outputs of a run:
//! - The CSV table, rewritten from scratch every run
//! - The SQLite snapshot the viewer loads, plus the history of runs

pub mod csv;
mod schema;
mod sqlite;
mod traits;
mod writer;

pub use csv::{read_table, CsvTable};
pub use sqlite::SnapshotStore;
pub use traits::{EntrySink, PersistenceError, PersistenceResult};
pub use writer::PersistenceWriter;

use crate::state::RunState;
use std::path::Path;

/// Opens (or creates) the snapshot store at `path`
pub fn open_snapshot(path: &Path) -> PersistenceResult<SnapshotStore> {
    SnapshotStore::open(path)
}

/// Represents a scrape run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunState,
    pub entry_count: u64,
}
