//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by a scrape, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for the gallery page and every thumbnail detail page
//! - Status classification (success, HTTP error, network error)
//! - Optional per-run memoisation of repeated detail page fetches
//!
//! There is no retry logic: a failed fetch is reported once and the caller
//! decides whether to skip the affected thumbnail or abort the run.

use crate::config::{FetchConfig, UserAgentConfig};
use reqwest::Client;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Classification of a single fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The server answered with a 2xx status
    Success,

    /// The server answered with any other status
    HttpError {
        /// The HTTP status code
        code: u16,
    },

    /// No usable response (connection refused, DNS failure, body read error, ...)
    NetworkError {
        /// Error description
        cause: String,
    },
}

impl FetchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::HttpError { code } => write!(f, "HTTP {}", code),
            Self::NetworkError { cause } => write!(f, "network error: {}", cause),
        }
    }
}

/// Raw markup of a fetched page plus its status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The requested URL
    pub url: String,
    /// Response body (empty on network errors)
    pub body: String,
    pub status: FetchStatus,
}

/// Something that can GET a page and classify the outcome
///
/// Implemented by [`HttpFetcher`] for real scrapes and by [`CachingFetcher`]
/// for deduplicated detail page lookups.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Issues one GET for `url`
    async fn fetch(&self, url: &str) -> FetchedPage;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    async fn fetch(&self, url: &str) -> FetchedPage {
        (**self).fetch(url).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy. No timeout is set
/// unless `fetch.timeout_secs` is configured.
///
/// # Example
///
/// ```no_run
/// use gallery_scrape::config::{FetchConfig, UserAgentConfig};
/// use gallery_scrape::scrape::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "GalleryScrape".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .brotli(true);

    if let Some(secs) = fetch.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Fetches a URL once and classifies the outcome
///
/// | Condition | Status |
/// |-----------|--------|
/// | HTTP 2xx | `Success` |
/// | Any other HTTP status | `HttpError { code }` (body still returned) |
/// | Transport failure or unreadable body | `NetworkError { cause }` |
pub async fn fetch_url(client: &Client, url: &str) -> FetchedPage {
    tracing::debug!("GET {}", url);

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let cause = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchedPage {
                url: url.to_string(),
                body: String::new(),
                status: FetchStatus::NetworkError { cause },
            };
        }
    };

    let code = response.status();

    match response.text().await {
        Ok(body) => FetchedPage {
            url: url.to_string(),
            body,
            status: if code.is_success() {
                FetchStatus::Success
            } else {
                FetchStatus::HttpError {
                    code: code.as_u16(),
                }
            },
        },
        Err(e) => FetchedPage {
            url: url.to_string(),
            body: String::new(),
            status: FetchStatus::NetworkError {
                cause: e.to_string(),
            },
        },
    }
}

/// [`PageFetcher`] backed by a reqwest [`Client`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the user agent and fetch sections of the config
    pub fn from_config(
        user_agent: &UserAgentConfig,
        fetch: &FetchConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, fetch)?))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchedPage {
        fetch_url(&self.client, url).await
    }
}

/// Memoises successful responses of an inner fetcher by URL
///
/// Failed fetches are not cached, so a later reference to the same URL gets
/// a fresh attempt. Meant to live for one run only.
pub struct CachingFetcher<F> {
    inner: F,
    cache: RefCell<HashMap<String, FetchedPage>>,
}

impl<F: PageFetcher> CachingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct URLs currently cached
    pub fn cached_pages(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<F: PageFetcher> PageFetcher for CachingFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchedPage {
        let cached = self.cache.borrow().get(url).cloned();
        if let Some(page) = cached {
            tracing::debug!("Cache hit: {}", url);
            return page;
        }

        let page = self.inner.fetch(url).await;
        if page.status.is_success() {
            self.cache
                .borrow_mut()
                .insert(url.to_string(), page.clone());
        }
        page
    }
}
