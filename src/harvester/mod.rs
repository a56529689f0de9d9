//! Source harvesters.
//!
//! A harvester drives one configured source from crawl to disk:
//!
//! - [`Adapter`] - site-specific crawling and item assembly, object safe via `async_trait`
//! - [`AdapterRegistry`] - maps the configured `class` string to an adapter constructor
//! - [`Harvester`] - pulls items from an adapter, filters them and writes them out
//! - [`ZobodatAdapter`] - crawler for the Zobodat literature pages
//!
//! # Lifecycle
//!
//! A [`Harvester`] starts in [`HarvestState::NotStarted`]. The first call to
//! [`Harvester::next_item`] runs the adapter's complete crawl
//! ([`HarvestState::Crawling`]), after which the collected records are
//! replayed one per call ([`HarvestState::Collected`]) until none remain
//! ([`HarvestState::Exhausted`]).

mod error;
mod registry;
mod zobodat;

pub use error::HarvestError;
pub use registry::{AdapterFactory, AdapterRegistry};
pub use zobodat::{
    COMPLETE_METADATA_KEY, ZOBODAT_DATA_SOURCE, ZOBODAT_URL, ZobodatAdapter,
};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{HarvestSettings, HarvesterConfig, MetadataFormat};
use crate::download::{Fetcher, RateLimiter};
use crate::filter::FilterEngine;
use crate::item::{Item, ItemError, Metadata};

/// Site-specific crawling and item assembly.
///
/// # Object Safety
///
/// This trait uses `async_trait` so adapters can be stored as
/// `Box<dyn Adapter>` in the [`AdapterRegistry`].
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Configured source name, also the key of its filter rules.
    fn name(&self) -> &str;

    /// Folder below the output root that receives this source's files.
    fn folder_name(&self) -> &str;

    /// Crawls the source completely and returns one record per item.
    ///
    /// Unreachable pages are logged and contribute no records.
    async fn discover(&self) -> Vec<Metadata>;

    /// Fills an empty item from one discovered record.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] when the record cannot become an item, for
    /// example because it carries no id.
    fn populate(&self, item: &mut Item, record: Metadata) -> Result<(), ItemError>;

    /// Pacing applied before every crawl request.
    fn rate_limiter(&self) -> &RateLimiter;
}

/// Progress of a [`Harvester`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    /// No crawl has run yet.
    NotStarted,
    /// The adapter is crawling.
    Crawling,
    /// Records are available for replay.
    Collected,
    /// Every record has been handed out.
    Exhausted,
}

/// Where and how a harvest run writes its output.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    /// Output root; the adapter's folder is created below it.
    pub root: PathBuf,
    /// Metadata file format.
    pub format: MetadataFormat,
    /// Replace files that already exist.
    pub overwrite: bool,
}

impl OutputOptions {
    /// Output options for one configured source.
    #[must_use]
    pub fn for_source(settings: &HarvestSettings, config: &HarvesterConfig) -> Self {
        Self {
            root: settings.general.output_path.clone(),
            format: settings.general.metadata_format,
            overwrite: config.overwrite,
        }
    }
}

/// Counters of one harvest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Items handed out by the adapter.
    pub discovered: usize,
    /// Items rejected by the filter engine.
    pub filtered: usize,
    /// Items whose metadata was written.
    pub written: usize,
    /// Text files downloaded.
    pub files: usize,
    /// Items whose metadata could not be written.
    pub failed: usize,
}

/// Drives one adapter: crawl, filter, write.
pub struct Harvester {
    adapter: Box<dyn Adapter>,
    filters: FilterEngine,
    state: HarvestState,
    pending: VecDeque<Metadata>,
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("adapter", &self.adapter.name())
            .field("filters", &self.filters.len())
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Harvester {
    /// Creates a harvester for an adapter and the filters of its source.
    #[must_use]
    pub fn new(adapter: Box<dyn Adapter>, filters: FilterEngine) -> Self {
        Self {
            adapter,
            filters,
            state: HarvestState::NotStarted,
            pending: VecDeque::new(),
        }
    }

    /// Builds the harvester for a configured source.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::UnknownAdapter`] if the source's kind is not
    /// registered, or [`HarvestError::Filter`] if the filter rules it resolves
    /// to are malformed or contain an unsupported value.
    pub fn from_config(
        registry: &AdapterRegistry,
        settings: &HarvestSettings,
        config: &HarvesterConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, HarvestError> {
        let rules = settings
            .filter_rules_for(&config.name)
            .map_err(|e| HarvestError::filter(&config.name, e))?;
        let filters = FilterEngine::from_configurations(rules)
            .map_err(|e| HarvestError::filter(&config.name, e))?;
        let adapter = registry.create(config, fetcher)?;
        debug!(
            source = %config.name,
            filters = filters.len(),
            "harvester created"
        );
        Ok(Self::new(adapter, filters))
    }

    /// The adapter this harvester drives.
    #[must_use]
    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HarvestState {
        self.state
    }

    /// Fills `item` with the next record, crawling first if needed.
    ///
    /// Returns `false` once all records were handed out. Records the adapter
    /// cannot turn into an item are logged and skipped.
    pub async fn next_item(&mut self, item: &mut Item) -> bool {
        if self.state == HarvestState::NotStarted {
            self.state = HarvestState::Crawling;
            let pacing = self.adapter.rate_limiter();
            info!(
                source = self.adapter.name(),
                delay_ms = pacing.delay().as_millis(),
                "start crawling metadata"
            );
            self.pending = self.adapter.discover().await.into();
            info!(
                source = self.adapter.name(),
                records = self.pending.len(),
                paused_secs = self.adapter.rate_limiter().cumulative_delay().as_secs(),
                "crawling of metadata complete"
            );
            self.state = HarvestState::Collected;
        }

        while let Some(record) = self.pending.pop_front() {
            match self.adapter.populate(item, record) {
                Ok(()) => return true,
                Err(e) => {
                    warn!(source = self.adapter.name(), error = %e, "skipping record");
                    *item = Item::new();
                }
            }
        }

        self.state = HarvestState::Exhausted;
        false
    }

    /// Whether the source's filters reject `item`.
    #[must_use]
    pub fn is_filtered_out(&self, item: &Item) -> bool {
        self.filters.is_filtered_out(item)
    }

    /// Harvests every item: filtered items are dropped, the rest have their
    /// metadata and text files written below
    /// `{root}/{folder_name}`.
    ///
    /// A failed metadata write only affects that item.
    #[instrument(skip(self, output, fetcher), fields(source = self.adapter.name()))]
    pub async fn run(&mut self, output: &OutputOptions, fetcher: &dyn Fetcher) -> HarvestStats {
        let folder = output.root.join(self.adapter.folder_name());
        let mut stats = HarvestStats::default();

        loop {
            let mut item = Item::new();
            if !self.next_item(&mut item).await {
                break;
            }
            stats.discovered += 1;

            if self.is_filtered_out(&item) {
                debug!(id = ?item.id(), "item filtered out");
                stats.filtered += 1;
                continue;
            }

            match write_item(&mut item, &folder, output, fetcher).await {
                Ok(files) => {
                    stats.written += 1;
                    stats.files += files;
                }
                Err(e) => {
                    error!(id = ?item.id(), error = %e, "cannot write item");
                    stats.failed += 1;
                }
            }
        }

        info!(
            discovered = stats.discovered,
            filtered = stats.filtered,
            written = stats.written,
            files = stats.files,
            failed = stats.failed,
            "harvest finished"
        );
        stats
    }
}

async fn write_item(
    item: &mut Item,
    folder: &Path,
    output: &OutputOptions,
    fetcher: &dyn Fetcher,
) -> Result<usize, ItemError> {
    item.write_metadata_file(folder, output.format.file_kind()).await?;
    let files = item
        .write_text_files(folder, output.overwrite, fetcher)
        .await?;
    Ok(files.len())
}
