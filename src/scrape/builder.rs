//! Cell classifier and field builder
//!
//! Turns one [`EntryCellGroup`] into a [`GalleryEntry`]:
//!
//! | Position | Role | Field |
//! |----------|------|-------|
//! | 1 | `Artworks` | every thumbnail resolved through its detail page |
//! | 2 | `Date` | text of the inner text container |
//! | 3 | `SourceTitle` | text of the inner text container |
//! | 4 | `SourceImages` | every thumbnail resolved through its detail page |
//!
//! A thumbnail that cannot be resolved is logged and left out; it never
//! aborts the entry.

use crate::config::SiteSelectors;
use crate::model::{GalleryEntry, ImageRef};
use crate::scrape::extractor::EntryCellGroup;
use crate::scrape::fetcher::PageFetcher;
use crate::scrape::query::{Document, Node};
use crate::scrape::site::Site;
use thiserror::Error;

/// Positional role of a cell inside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRole {
    Artworks,
    Date,
    SourceTitle,
    SourceImages,
}

impl CellRole {
    /// Roles in positional order
    pub const ALL: [CellRole; 4] = [
        CellRole::Artworks,
        CellRole::Date,
        CellRole::SourceTitle,
        CellRole::SourceImages,
    ];

    /// 1-based position of this role in the row
    pub fn position(&self) -> usize {
        match self {
            Self::Artworks => 1,
            Self::Date => 2,
            Self::SourceTitle => 3,
            Self::SourceImages => 4,
        }
    }
}

/// Why a detail page yielded no image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailPageError {
    #[error("media container not found")]
    ContainerMissing,

    #[error("no media element inside the container")]
    MediaMissing,

    #[error("media element has no src")]
    SourceMissing,
}

/// An entry whose cells have been classified but whose thumbnails are not resolved yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedEntry {
    /// Detail page URLs of the artwork thumbnails, in document order
    pub artwork_links: Vec<String>,
    pub date: String,
    pub source_title: String,
    /// Detail page URLs of the source thumbnails, in document order
    pub source_links: Vec<String>,
}

/// Classifies every cell of a group and reads its raw field
///
/// This step does no I/O. Missing positions and text cells without an inner
/// text container produce empty fields.
pub fn classify_cells(group: &EntryCellGroup<'_>, site: &Site) -> ClassifiedEntry {
    let mut classified = ClassifiedEntry::default();

    for role in CellRole::ALL {
        let Some(cell) = group.cell_at(role.position()) else {
            tracing::debug!("Entry has no cell for {:?}", role);
            continue;
        };

        match role {
            CellRole::Artworks => classified.artwork_links = thumbnail_links(cell, site),
            CellRole::Date => classified.date = cell_text(cell, site.selectors()),
            CellRole::SourceTitle => classified.source_title = cell_text(cell, site.selectors()),
            CellRole::SourceImages => classified.source_links = thumbnail_links(cell, site),
        }
    }

    classified
}

/// Detail page URLs of every thumbnail link in an image cell
fn thumbnail_links(cell: Node<'_>, site: &Site) -> Vec<String> {
    let mut links = Vec::new();

    for anchor in cell.find_all(&site.selectors().thumbnail) {
        let Some(href) = anchor.attr("href") else {
            tracing::warn!("Skipping thumbnail link without href");
            continue;
        };

        match site.detail_url(href) {
            Ok(url) => links.push(url.to_string()),
            Err(e) => tracing::warn!("Skipping thumbnail link '{}': {}", href, e),
        }
    }

    links
}

/// Concatenated text of a cell's inner text container
fn cell_text(cell: Node<'_>, selectors: &SiteSelectors) -> String {
    match cell.find(&selectors.text_container) {
        Some(container) => container.text(),
        None => {
            tracing::debug!("Text cell has no inner text container, using empty text");
            String::new()
        }
    }
}

/// Reads the media element of a detail page
///
/// The alt text defaults to empty when the attribute is absent.
pub fn parse_detail_page(
    markup: &str,
    selectors: &SiteSelectors,
) -> Result<ImageRef, DetailPageError> {
    let document = Document::parse(markup);

    let container = document
        .root()
        .find(&selectors.detail_container)
        .ok_or(DetailPageError::ContainerMissing)?;

    let media = container
        .find(&selectors.media)
        .ok_or(DetailPageError::MediaMissing)?;

    let src = media
        .attr("src")
        .filter(|src| !src.is_empty())
        .ok_or(DetailPageError::SourceMissing)?;

    Ok(ImageRef::new(src, media.attr("alt").unwrap_or_default()))
}

/// Fetches one detail page and resolves its image
///
/// Returns `None` (after logging a warning) if the fetch fails or the page
/// has no usable media element.
pub async fn resolve_thumbnail<F: PageFetcher>(
    fetcher: &F,
    site: &Site,
    detail_url: &str,
) -> Option<ImageRef> {
    let page = fetcher.fetch(detail_url).await;

    if !page.status.is_success() {
        tracing::warn!("Skipping thumbnail {}: {}", detail_url, page.status);
        return None;
    }

    match parse_detail_page(&page.body, site.selectors()) {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!("Skipping thumbnail {}: {}", detail_url, e);
            None
        }
    }
}

/// Resolves detail page URLs one after another, keeping their order
pub async fn resolve_thumbnails<F: PageFetcher>(
    fetcher: &F,
    site: &Site,
    detail_urls: &[String],
) -> Vec<ImageRef> {
    let mut images = Vec::with_capacity(detail_urls.len());
    for url in detail_urls {
        if let Some(image) = resolve_thumbnail(fetcher, site, url).await {
            images.push(image);
        }
    }
    images
}

/// Builds a complete [`GalleryEntry`] from one cell group
///
/// Artworks are resolved before source images; both keep the left-to-right
/// order of their thumbnails.
pub async fn build_entry<F: PageFetcher>(
    group: &EntryCellGroup<'_>,
    fetcher: &F,
    site: &Site,
) -> GalleryEntry {
    let classified = classify_cells(group, site);

    let artworks = resolve_thumbnails(fetcher, site, &classified.artwork_links).await;
    let source_images = resolve_thumbnails(fetcher, site, &classified.source_links).await;

    GalleryEntry::new(
        artworks,
        classified.date,
        classified.source_title,
        source_images,
    )
}
