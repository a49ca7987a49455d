//! Orchestrator - one sequential scrape of the gallery page
//!
//! This module drives a run end to end:
//! - Recording the run in the snapshot store
//! - Fetching the gallery page and locating its entries
//! - Building each entry (one detail page fetch per thumbnail)
//! - Handing every completed entry to the persistence writer, in order
//!
//! Entry N is fully built and persisted before entry N+1 is looked at.

use crate::config::Config;
use crate::model::GalleryEntry;
use crate::scrape::builder::build_entry;
use crate::scrape::extractor::{EntryGroups, GalleryDocument};
use crate::scrape::fetcher::{CachingFetcher, FetchStatus, HttpFetcher, PageFetcher};
use crate::scrape::site::Site;
use crate::state::RunState;
use crate::storage::{EntrySink, PersistenceError, PersistenceWriter, SnapshotStore};
use crate::{ExtractionError, ScrapeError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a run stopped early
///
/// Each variant corresponds to one aborted [`RunState`].
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("gallery page {url} could not be fetched: {status}")]
    AbortedFetchFailure { url: String, status: FetchStatus },

    #[error("gallery page does not match the expected markup: {0}")]
    AbortedExtractionFailure(#[from] ExtractionError),

    #[error("persistence failed after {} entries: {source}", .persisted.len())]
    AbortedPersistenceFailure {
        source: PersistenceError,
        /// Entries fully persisted before the failure
        persisted: Vec<GalleryEntry>,
    },
}

impl OrchestratorError {
    /// The terminal state the run ended in
    pub fn state(&self) -> RunState {
        match self {
            Self::AbortedFetchFailure { .. } => RunState::AbortedFetchFailure,
            Self::AbortedExtractionFailure(_) => RunState::AbortedExtractionFailure,
            Self::AbortedPersistenceFailure { .. } => RunState::AbortedPersistenceFailure,
        }
    }

    /// Entries that reached both outputs before the run stopped
    pub fn persisted(&self) -> &[GalleryEntry] {
        match self {
            Self::AbortedPersistenceFailure { persisted, .. } => persisted,
            _ => &[],
        }
    }
}

/// Drives scrape runs against one site
pub struct Orchestrator<F> {
    site: Site,
    fetcher: F,
    store: SnapshotStore,
    csv_path: PathBuf,
    config_hash: String,
    dedupe_detail_pages: bool,
    state: RunState,
}

impl Orchestrator<HttpFetcher> {
    /// Creates an orchestrator from a validated configuration
    ///
    /// Opens (or creates) the snapshot store; the CSV table is not touched
    /// until a run has found the gallery container.
    pub fn from_config(config: &Config, config_hash: &str) -> Result<Self, ScrapeError> {
        let site = Site::from_config(config)?;
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetch)?;
        let store = SnapshotStore::open(Path::new(&config.output.snapshot_path))?;

        Ok(
            Self::new(site, fetcher, store, &config.output.csv_path, config_hash)
                .with_dedupe(config.fetch.dedupe_detail_pages),
        )
    }
}

impl<F: PageFetcher> Orchestrator<F> {
    pub fn new(
        site: Site,
        fetcher: F,
        store: SnapshotStore,
        csv_path: impl Into<PathBuf>,
        config_hash: &str,
    ) -> Self {
        Self {
            site,
            fetcher,
            store,
            csv_path: csv_path.into(),
            config_hash: config_hash.to_string(),
            dedupe_detail_pages: false,
            state: RunState::Start,
        }
    }

    /// Memoise detail page fetches by URL within each run
    pub fn with_dedupe(mut self, dedupe_detail_pages: bool) -> Self {
        self.dedupe_detail_pages = dedupe_detail_pages;
        self
    }

    /// State of the current (or last) run
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Scrapes `gallery_url` once
    ///
    /// # Returns
    ///
    /// * `Ok(entries)` - Every entry in document order, all persisted
    /// * `Err(OrchestratorError)` - The run aborted; see [`OrchestratorError::persisted`]
    pub async fn run(&mut self, gallery_url: &str) -> Result<Vec<GalleryEntry>, OrchestratorError> {
        self.state = RunState::Start;
        tracing::info!("Starting scrape of {}", gallery_url);

        let run_id = match self.store.create_run(&self.config_hash) {
            Ok(id) => id,
            Err(source) => {
                advance(&mut self.state, RunState::AbortedPersistenceFailure);
                tracing::error!("Could not record run: {}", source);
                return Err(OrchestratorError::AbortedPersistenceFailure {
                    source,
                    persisted: Vec::new(),
                });
            }
        };

        match self.scrape(run_id, gallery_url).await {
            Ok(entries) => self.finish(run_id, entries),
            Err(e) => {
                tracing::error!("Run {} aborted: {}", run_id, e);
                if let Err(history) = self.store.finish_run(run_id, self.state, e.persisted().len())
                {
                    tracing::error!("Failed to record outcome of run {}: {}", run_id, history);
                }
                Err(e)
            }
        }
    }

    /// Records a complete run; the run is only done once its history says so
    fn finish(
        &mut self,
        run_id: i64,
        entries: Vec<GalleryEntry>,
    ) -> Result<Vec<GalleryEntry>, OrchestratorError> {
        match self.store.finish_run(run_id, RunState::Done, entries.len()) {
            Ok(()) => {
                advance(&mut self.state, RunState::Done);
                tracing::info!("Run {} done: {} entries", run_id, entries.len());
                Ok(entries)
            }
            Err(source) => {
                advance(&mut self.state, RunState::AbortedPersistenceFailure);
                tracing::error!("Could not record completion of run {}: {}", run_id, source);
                Err(OrchestratorError::AbortedPersistenceFailure {
                    source,
                    persisted: entries,
                })
            }
        }
    }

    async fn scrape(
        &mut self,
        run_id: i64,
        gallery_url: &str,
    ) -> Result<Vec<GalleryEntry>, OrchestratorError> {
        let Self {
            site,
            fetcher,
            store,
            csv_path,
            dedupe_detail_pages,
            state,
            ..
        } = self;

        advance(state, RunState::FetchingPage);
        let page = fetcher.fetch(gallery_url).await;
        if !page.status.is_success() {
            advance(state, RunState::AbortedFetchFailure);
            return Err(OrchestratorError::AbortedFetchFailure {
                url: page.url,
                status: page.status,
            });
        }

        advance(state, RunState::ExtractingEntries);
        let document = GalleryDocument::parse(&page.body);
        let groups = match document.entries(site.selectors()) {
            Ok(groups) => groups,
            Err(e) => {
                advance(state, RunState::AbortedExtractionFailure);
                return Err(e.into());
            }
        };

        let mut writer = match PersistenceWriter::open(csv_path.as_path(), store, run_id) {
            Ok(writer) => writer,
            Err(source) => {
                advance(state, RunState::AbortedPersistenceFailure);
                return Err(OrchestratorError::AbortedPersistenceFailure {
                    source,
                    persisted: Vec::new(),
                });
            }
        };

        if *dedupe_detail_pages {
            let detail_fetcher = CachingFetcher::new(&*fetcher);
            let outcome = build_all(groups, &detail_fetcher, site, &mut writer, state).await;
            tracing::debug!("Cached {} detail pages", detail_fetcher.cached_pages());
            outcome
        } else {
            build_all(groups, &*fetcher, site, &mut writer, state).await
        }
    }
}

/// Builds and persists every entry in order
async fn build_all<D: PageFetcher>(
    groups: EntryGroups<'_>,
    detail_fetcher: &D,
    site: &Site,
    sink: &mut impl EntrySink,
    state: &mut RunState,
) -> Result<Vec<GalleryEntry>, OrchestratorError> {
    let mut entries = Vec::new();

    for group in groups {
        advance(state, RunState::BuildingEntry);
        let entry = build_entry(&group, detail_fetcher, site).await;

        if let Err(source) = sink.append(&entry) {
            advance(state, RunState::AbortedPersistenceFailure);
            return Err(OrchestratorError::AbortedPersistenceFailure {
                source,
                persisted: entries,
            });
        }

        tracing::info!(
            "Entry {}: {} ({} images)",
            entries.len() + 1,
            entry,
            entry.image_count()
        );
        entries.push(entry);
    }

    Ok(entries)
}

fn advance(state: &mut RunState, next: RunState) {
    if state.can_transition_to(next) {
        tracing::debug!("Run state: {} -> {}", state, next);
        *state = next;
    } else {
        tracing::error!("Refusing run state transition {} -> {}", state, next);
    }
}

/// Scrapes the configured gallery once with a real HTTP client
///
/// # Example
///
/// ```no_run
/// use gallery_scrape::config::load_config_with_hash;
/// use gallery_scrape::scrape::run_scrape;
/// use std::path::Path;
///
/// # async fn example() -> gallery_scrape::Result<()> {
/// let (config, hash) = load_config_with_hash(Path::new("gallery.toml"))?;
/// let entries = run_scrape(&config, &hash).await?;
/// println!("{} entries", entries.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_scrape(config: &Config, config_hash: &str) -> Result<Vec<GalleryEntry>, ScrapeError> {
    let mut orchestrator = Orchestrator::from_config(config, config_hash)?;
    let entries = orchestrator.run(&config.site.gallery_url).await?;
    Ok(entries)
}
