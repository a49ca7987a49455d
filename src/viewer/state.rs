//! Viewer selection state
//!
//! Holds the loaded entries plus which entry, which image list and which image
//! are on screen. Every UI event maps to one method here; none of them do I/O.

use crate::model::{GalleryEntry, ImageRef};
use std::fmt;

/// Which of an entry's two image lists is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageList {
    #[default]
    Artworks,
    SourceImages,
}

impl ImageList {
    pub fn images<'e>(&self, entry: &'e GalleryEntry) -> &'e [ImageRef] {
        match self {
            Self::Artworks => &entry.artworks,
            Self::SourceImages => &entry.source_images,
        }
    }
}

impl fmt::Display for ImageList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artworks => write!(f, "Artworks"),
            Self::SourceImages => write!(f, "Source"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    entries: Vec<GalleryEntry>,
    selected: Option<usize>,
    list: ImageList,
    index: usize,
}

impl ViewerState {
    /// Starts with nothing selected
    pub fn new(entries: Vec<GalleryEntry>) -> Self {
        Self {
            entries,
            selected: None,
            list: ImageList::Artworks,
            index: 0,
        }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Selects entry `position`, showing its first artwork
    ///
    /// Returns false, leaving the state unchanged, if there is no such entry.
    pub fn select_entry(&mut self, position: usize) -> bool {
        if position >= self.entries.len() {
            return false;
        }
        self.selected = Some(position);
        self.list = ImageList::Artworks;
        self.index = 0;
        true
    }

    pub fn selected_entry(&self) -> Option<&GalleryEntry> {
        self.selected.and_then(|position| self.entries.get(position))
    }

    /// Switches image list and rewinds to its first image
    pub fn select_list(&mut self, list: ImageList) {
        self.list = list;
        self.index = 0;
    }

    pub fn list(&self) -> ImageList {
        self.list
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Images of the displayed list (empty with no selection)
    pub fn current_list(&self) -> &[ImageRef] {
        self.selected_entry()
            .map(|entry| self.list.images(entry))
            .unwrap_or_default()
    }

    pub fn current_image(&self) -> Option<&ImageRef> {
        self.current_list().get(self.index)
    }

    /// Advances to the next image, wrapping to the first
    pub fn next(&mut self) {
        let len = self.current_list().len();
        if len > 0 {
            self.index = (self.index + 1) % len;
        }
    }

    /// Steps back to the previous image, wrapping to the last
    pub fn prev(&mut self) {
        let len = self.current_list().len();
        if len > 0 {
            self.index = (self.index + len - 1) % len;
        }
    }

    /// `"{i} of {n}"`, 1-based; `None` for an empty list
    pub fn position_label(&self) -> Option<String> {
        let len = self.current_list().len();
        (len > 0).then(|| format!("{} of {}", self.index + 1, len))
    }

    /// Prev/next controls only make sense with more than one image
    pub fn shows_navigation(&self) -> bool {
        self.current_list().len() > 1
    }
}
