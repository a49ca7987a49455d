//! The gallery site contract: base origin plus compiled markup markers

use crate::config::{Config, SiteSelectors};
use crate::ScrapeError;
use url::Url;

/// Everything the extraction pipeline needs to know about the wiki
#[derive(Debug, Clone)]
pub struct Site {
    base_origin: Url,
    selectors: SiteSelectors,
}

impl Site {
    pub fn new(base_origin: Url, selectors: SiteSelectors) -> Self {
        Self {
            base_origin,
            selectors,
        }
    }

    /// Builds the site contract from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        let base_origin = Url::parse(&config.site.base_origin)?;
        let selectors = SiteSelectors::compile(&config.markup)?;
        Ok(Self::new(base_origin, selectors))
    }

    pub fn selectors(&self) -> &SiteSelectors {
        &self.selectors
    }

    /// Resolves a thumbnail's link against the base origin
    ///
    /// Root-relative links (`/wiki/File:X.png`) land on the base origin;
    /// absolute links are kept as they are.
    pub fn detail_url(&self, href: &str) -> Result<Url, url::ParseError> {
        self.base_origin.join(href.trim())
    }
}
