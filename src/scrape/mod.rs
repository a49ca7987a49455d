//! Scrape module - the extraction pipeline
//!
//! This module contains everything between a gallery URL and a list of
//! entries:
//! - HTTP fetching with a configured user agent
//! - A small structural-query layer over the parsed HTML
//! - Gallery table extraction and per-entry cell classification
//! - Detail page resolution for every thumbnail
//! - The orchestrator that runs it all, entry by entry

mod builder;
mod extractor;
mod fetcher;
mod orchestrator;
mod query;
mod site;

pub use builder::{
    build_entry, classify_cells, parse_detail_page, resolve_thumbnail, CellRole,
    ClassifiedEntry, DetailPageError,
};
pub use extractor::{EntryCellGroup, EntryGroups, GalleryDocument, CELLS_PER_ENTRY};
pub use fetcher::{
    build_http_client, fetch_url, CachingFetcher, FetchStatus, FetchedPage, HttpFetcher,
    PageFetcher,
};
pub use orchestrator::{run_scrape, Orchestrator, OrchestratorError};
pub use query::{Document, Node};
pub use site::Site;
