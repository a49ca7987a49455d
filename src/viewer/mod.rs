//! Viewer inbound interface
//!
//! The desktop viewer itself is an external collaborator. This module gives it
//! what it consumes:
//! - `load_entries`: the stored snapshot, without re-scraping
//! - `fetch_image_bytes`: any image URL as PNG bytes
//! - `ViewerState`: selection and navigation, as pure transitions

mod fetch;
mod state;

pub use fetch::{build_image_client, encode_png, fetch_image_bytes, ImageFetchError, BROWSER_USER_AGENT};
pub use state::{ImageList, ViewerState};

use crate::model::GalleryEntry;
use crate::storage::{PersistenceResult, SnapshotStore};
use std::path::Path;

/// Loads the snapshot at `snapshot_path` in document order
///
/// A missing snapshot is an error rather than an empty gallery, so a wrong
/// path is never mistaken for a site with no entries. The file is opened
/// read-only and is never written.
pub fn load_entries(snapshot_path: &Path) -> PersistenceResult<Vec<GalleryEntry>> {
    std::fs::metadata(snapshot_path)?;
    let store = SnapshotStore::open_read_only(snapshot_path)?;
    store.load_entries()
}
