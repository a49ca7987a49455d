//! Persistence traits and error types
//!
//! This module defines the sink interface the orchestrator writes completed
//! entries through, and the error type shared by every persistence backend.

use crate::model::GalleryEntry;
use thiserror::Error;

/// Errors that can occur while persisting entries
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Destination for completed gallery entries
///
/// Entries arrive in document order, exactly once each. A failed append is
/// fatal to the run.
pub trait EntrySink {
    /// Persists one completed entry
    fn append(&mut self, entry: &GalleryEntry) -> PersistenceResult<()>;

    /// Number of entries appended so far
    fn appended(&self) -> usize;
}
