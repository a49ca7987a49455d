//! Fan-out of completed entries to both persistent outputs

use crate::model::GalleryEntry;
use crate::storage::csv::CsvTable;
use crate::storage::sqlite::SnapshotStore;
use crate::storage::traits::{EntrySink, PersistenceResult};
use std::path::Path;

/// Writes each entry to the snapshot store, then to the table
///
/// An entry whose table row cannot be written is taken back out of the
/// snapshot, so both outputs always hold the same entries.
pub struct PersistenceWriter<'s, T = CsvTable> {
    table: T,
    snapshot: &'s mut SnapshotStore,
    run_id: i64,
    written: usize,
}

impl<'s> PersistenceWriter<'s, CsvTable> {
    /// Clears the previous snapshot, then truncates the CSV table
    ///
    /// The CSV file is opened first without truncation, so a path that
    /// cannot be opened leaves the old snapshot in place, and a snapshot
    /// that cannot be cleared leaves the old table in place.
    pub fn open(
        csv_path: &Path,
        snapshot: &'s mut SnapshotStore,
        run_id: i64,
    ) -> PersistenceResult<Self> {
        let mut table = CsvTable::open(csv_path)?;
        snapshot.begin_snapshot(run_id)?;
        table.reset()?;

        tracing::debug!(
            "Opened outputs for run {} (csv: {})",
            run_id,
            csv_path.display()
        );

        Ok(Self::new(table, snapshot, run_id))
    }
}

impl<'s, T: EntrySink> PersistenceWriter<'s, T> {
    fn new(table: T, snapshot: &'s mut SnapshotStore, run_id: i64) -> Self {
        Self {
            table,
            snapshot,
            run_id,
            written: 0,
        }
    }
}

impl<T: EntrySink> EntrySink for PersistenceWriter<'_, T> {
    fn append(&mut self, entry: &GalleryEntry) -> PersistenceResult<()> {
        let position = self.written;
        self.snapshot.append_entry(self.run_id, position, entry)?;

        if let Err(e) = self.table.append(entry) {
            if let Err(rollback) = self.snapshot.remove_entry(position) {
                tracing::error!(
                    "Entry {} stays in the snapshot without a table row: {}",
                    position,
                    rollback
                );
            }
            return Err(e);
        }

        self.written += 1;
        Ok(())
    }

    fn appended(&self) -> usize {
        self.written
    }
}
