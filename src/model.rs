//! Record model for scraped gallery entries
//!
//! An entry aggregates two independent, ordered lists of resolved images plus
//! the free-form date and source title text of one gallery table.

use std::fmt;

/// A resolved image: its real source URL and alt text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    source_url: String,
    alt_text: String,
}

impl ImageRef {
    /// Creates an image reference from a detail page's media attributes
    pub fn new(source_url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            alt_text: alt_text.into(),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn alt_text(&self) -> &str {
        &self.alt_text
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<src: {}\nalt: {}>", self.source_url, self.alt_text)
    }
}

/// One row of the gallery: artworks, date, source title and source images
///
/// `artworks` and `source_images` keep the left-to-right order in which the
/// thumbnails appear in the source row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryEntry {
    pub artworks: Vec<ImageRef>,
    pub date: String,
    pub source_title: String,
    pub source_images: Vec<ImageRef>,
}

impl GalleryEntry {
    pub fn new(
        artworks: Vec<ImageRef>,
        date: impl Into<String>,
        source_title: impl Into<String>,
        source_images: Vec<ImageRef>,
    ) -> Self {
        Self {
            artworks,
            date: date.into(),
            source_title: source_title.into(),
            source_images,
        }
    }

    /// Total number of resolved images across both lists
    pub fn image_count(&self) -> usize {
        self.artworks.len() + self.source_images.len()
    }
}

/// Entries are listed by their source title
impl fmt::Display for GalleryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_title)
    }
}
