//! Gallery-Scrape: an art gallery scraper for a wiki
//!
//! This crate fetches a wiki's "Art Gallery" page, walks its nested entry
//! tables, resolves every thumbnail through its detail page, and persists the
//! resulting entries to a CSV table and a SQLite snapshot that a viewer can
//! load without re-scraping.

pub mod config;
pub mod model;
pub mod scrape;
pub mod state;
pub mod storage;
pub mod viewer;

use thiserror::Error;

/// Main error type for Gallery-Scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Run aborted: {0}")]
    Aborted(#[from] scrape::OrchestratorError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::PersistenceError),

    #[error("Image fetch error: {0}")]
    ImageFetch(#[from] viewer::ImageFetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid markup marker: {0}")]
    InvalidSelector(String),
}

/// Structural mismatches between a page and the expected markup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("container not found: no element matches `{selector}`")]
    ContainerNotFound { selector: String },
}

/// Result type alias for Gallery-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{GalleryEntry, ImageRef};
pub use state::RunState;
