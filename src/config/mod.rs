//! Configuration module for Gallery-Scrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use gallery_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gallery.toml")).unwrap();
//! println!("Scraping: {}", config.site.gallery_url);
//! ```

mod parser;
mod selectors;
mod types;
mod validation;

// Re-export types
pub use selectors::SiteSelectors;
pub use types::{
    Config, FetchConfig, MarkupConfig, OutputConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
