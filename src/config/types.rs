use serde::Deserialize;

/// Main configuration structure for Gallery-Scrape
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Where the gallery lives
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin that relative thumbnail links are resolved against
    #[serde(rename = "base-origin")]
    pub base_origin: String,

    /// The gallery page itself
    #[serde(rename = "gallery-url")]
    pub gallery_url: String,
}

/// Structural markers of the gallery and detail pages
///
/// A change to any of these on the live site breaks extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkupConfig {
    /// Class of the `<div>` holding every gallery entry
    #[serde(rename = "container-class", default = "default_container_class")]
    pub container_class: String,

    /// Class list of the `<table>` for one entry (space separated)
    #[serde(rename = "entry-class", default = "default_entry_class")]
    pub entry_class: String,

    /// Class of the `<td>` cells inside an entry
    #[serde(rename = "cell-class", default = "default_cell_class")]
    pub cell_class: String,

    /// Tag wrapping the text of the date and title cells
    #[serde(rename = "text-container", default = "default_text_container")]
    pub text_container: String,

    /// `id` of the `<div>` holding the media element on a detail page
    #[serde(rename = "detail-container-id", default = "default_detail_container_id")]
    pub detail_container_id: String,
}

fn default_container_class() -> String {
    "phantom-blood-tabs".to_string()
}

fn default_entry_class() -> String {
    "diamonds volume".to_string()
}

fn default_cell_class() -> String {
    "volume".to_string()
}

fn default_text_container() -> String {
    "center".to_string()
}

fn default_detail_container_id() -> String {
    "file".to_string()
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            container_class: default_container_class(),
            entry_class: default_entry_class(),
            cell_class: default_cell_class(),
            text_container: default_text_container(),
            detail_container_id: default_detail_container_id(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scraper
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scraper
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV table
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path to the SQLite snapshot store
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}

/// Fetch behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchConfig {
    /// Memoise detail page responses by URL for the duration of a run
    #[serde(rename = "dedupe-detail-pages", default)]
    pub dedupe_detail_pages: bool,

    /// Whole-request timeout; the transport default (none) when absent
    #[serde(rename = "timeout-secs", default)]
    pub timeout_secs: Option<u64>,
}
