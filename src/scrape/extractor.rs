//! Table extractor for the gallery page
//!
//! Locates the gallery container, then yields one [`EntryCellGroup`] per entry
//! table inside it. Cells are positional: 1 = artwork images, 2 = date,
//! 3 = source title, 4 = source images.

use crate::config::SiteSelectors;
use crate::scrape::query::{Document, Node, Nodes};
use crate::ExtractionError;

/// Number of positional cells in one gallery entry
pub const CELLS_PER_ENTRY: usize = 4;

/// A parsed gallery page
pub struct GalleryDocument {
    document: Document,
}

impl GalleryDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Document::parse(markup),
        }
    }

    /// Enumerates the entries of the gallery
    ///
    /// The returned iterator is lazy and single-pass; starting over means
    /// parsing the page again.
    ///
    /// # Returns
    ///
    /// * `Ok(EntryGroups)` - The container was found (it may hold zero entries)
    /// * `Err(ExtractionError::ContainerNotFound)` - The page structure changed
    pub fn entries<'a>(
        &'a self,
        selectors: &'a SiteSelectors,
    ) -> Result<EntryGroups<'a>, ExtractionError> {
        let container = self.document.root().find(&selectors.container).ok_or_else(|| {
            ExtractionError::ContainerNotFound {
                selector: selectors.container_source().to_string(),
            }
        })?;

        Ok(EntryGroups {
            tables: container.find_all(&selectors.entry),
            cell: &selectors.cell,
        })
    }
}

/// Lazy sequence of entry cell groups, in document order
pub struct EntryGroups<'a> {
    tables: Nodes<'a, 'a>,
    cell: &'a scraper::Selector,
}

impl<'a> Iterator for EntryGroups<'a> {
    type Item = EntryCellGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.tables.next()?;
        Some(EntryCellGroup::from_cells(table.find_all(self.cell)))
    }
}

/// The ordered cells of one entry
///
/// Holds at most [`CELLS_PER_ENTRY`] cells; any further cells are ignored and
/// missing positions read as empty.
#[derive(Debug, Clone)]
pub struct EntryCellGroup<'a> {
    cells: Vec<Node<'a>>,
}

impl<'a> EntryCellGroup<'a> {
    pub fn from_cells(cells: impl IntoIterator<Item = Node<'a>>) -> Self {
        let mut cells = cells.into_iter();
        let group: Vec<_> = cells.by_ref().take(CELLS_PER_ENTRY).collect();

        let extra = cells.count();
        if extra > 0 {
            tracing::debug!("Ignoring {} cells beyond position {}", extra, CELLS_PER_ENTRY);
        }

        Self { cells: group }
    }

    /// The cell at 1-based `position`, if the row has one
    pub fn cell_at(&self, position: usize) -> Option<Node<'a>> {
        position
            .checked_sub(1)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Number of populated positions
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if every position is populated
    pub fn is_complete(&self) -> bool {
        self.cells.len() == CELLS_PER_ENTRY
    }
}
