//! Crawler for the Zobodat literature pages.
//!
//! Zobodat organises literature as series → volumes → articles, each level a
//! paginated listing of `li.result` nodes. The crawl walks that tree with an
//! explicit worklist: a listing whose child links all lead to pages without
//! listings is an article list, and each of its nodes becomes a record.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::{Adapter, HarvestError};
use crate::config::HarvesterConfig;
use crate::download::{Fetcher, RateLimiter};
use crate::item::{FileKind, Item, ItemError, Metadata};
use crate::parser::{Citation, LinkClassifier, extract_citation_from_html};

/// Zobodat site root.
pub const ZOBODAT_URL: &str = "https://www.zobodat.at";

/// Data source tag and output folder of Zobodat items.
pub const ZOBODAT_DATA_SOURCE: &str = "Zobodat";

/// Item metadata key holding the complete crawled record.
pub const COMPLETE_METADATA_KEY: &str = "CompleteMetadata";

/// Container of the citation on an article page.
pub const CITATION_CONTAINER_SELECTOR: &str = "#publikation_articles .text";

const LITERATURE_PATH: &str = "publikation_series.php";
const ARTICLE_ID_PATH: &str = "publikation_articles.php?id=";
const SERIES_ID_PATH: &str = "publikation_series.php?id=";

const RECORD_ID: &str = "id";
const RECORD_PDF_URL: &str = "pdfUrl";
const RECORD_CITATION: &str = "citation";
const RECORD_URL: &str = "url";

#[allow(clippy::expect_used)]
static DEFAULT_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(ZOBODAT_URL).expect("Zobodat base URL is valid"));

#[allow(clippy::expect_used)]
static ITEM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?id=([0-9]+)").expect("item id regex is valid"));

#[allow(clippy::expect_used)]
static LISTING_ENTRY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul.search-results-list li.result").expect("listing selector is valid")
});

#[allow(clippy::expect_used)]
static NEXT_PAGE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.arrow.next a").expect("next page selector is valid"));

#[allow(clippy::expect_used)]
static CHILD_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".content a.red").expect("child link selector is valid"));

#[allow(clippy::expect_used)]
static PUBLICATION_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a.publication-link").expect("publication link selector is valid")
});

#[allow(clippy::expect_used)]
static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.content").expect("content selector is valid"));

#[allow(clippy::expect_used)]
static DIV: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("div selector is valid"));

#[allow(clippy::expect_used)]
static HYPERLINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("hyperlink selector is valid"));

/// One `li.result` node of a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ListingEntry {
    child_url: Option<String>,
    pdf_url: Option<String>,
    citation_url: Option<String>,
}

/// A parsed listing page.
#[derive(Debug, Default)]
struct ListingPage {
    entries: Vec<ListingEntry>,
    next_page: Option<String>,
}

/// Harvests literature from Zobodat.
pub struct ZobodatAdapter {
    config: HarvesterConfig,
    base_url: Url,
    fetcher: Arc<dyn Fetcher>,
    rate_limiter: RateLimiter,
    classifier: LinkClassifier,
    publication_list: Vec<String>,
}

impl std::fmt::Debug for ZobodatAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZobodatAdapter")
            .field("name", &self.config.name)
            .field("base_url", &self.base_url.as_str())
            .field("publication_list", &self.publication_list.len())
            .finish_non_exhaustive()
    }
}

impl ZobodatAdapter {
    /// Creates an adapter for the public Zobodat site.
    #[must_use]
    pub fn new(config: HarvesterConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::from_parts(config, fetcher, DEFAULT_BASE_URL.clone())
    }

    /// Creates an adapter for a Zobodat-like site at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute URL.
    pub fn with_base_url(
        config: HarvesterConfig,
        fetcher: Arc<dyn Fetcher>,
        base_url: &str,
    ) -> Result<Self, HarvestError> {
        let parsed =
            Url::parse(base_url).map_err(|e| HarvestError::invalid_base_url(base_url, e))?;
        Ok(Self::from_parts(config, fetcher, parsed))
    }

    fn from_parts(config: HarvesterConfig, fetcher: Arc<dyn Fetcher>, base_url: Url) -> Self {
        let publication_list = config
            .items
            .iter()
            .map(|id| format!("{ARTICLE_ID_PATH}{id}"))
            .chain(config.titles.iter().map(|id| format!("{SERIES_ID_PATH}{id}")))
            .filter_map(|path| resolve(&base_url, &path))
            .collect();
        let rate_limiter = RateLimiter::new(config.request_delay);

        Self {
            config,
            base_url,
            fetcher,
            rate_limiter,
            classifier: Self::link_classifier(),
            publication_list,
        }
    }

    /// Recognizes author, series and volume links in Zobodat citations.
    #[must_use]
    pub fn link_classifier() -> LinkClassifier {
        LinkClassifier::new("personen.php", "publikation_series.php", "publikation_volumes.php")
    }

    /// URLs of the configured articles and series, articles first.
    #[must_use]
    pub fn publication_list(&self) -> &[String] {
        &self.publication_list
    }

    /// Where the crawl starts: the configured publications, or the whole
    /// literature index when none are configured or `crawl-all-items` is set.
    #[must_use]
    pub fn start_urls(&self) -> Vec<String> {
        if self.config.crawl_all_items || self.publication_list.is_empty() {
            resolve(&self.base_url, LITERATURE_PATH).into_iter().collect()
        } else {
            self.publication_list.clone()
        }
    }

    /// Whether a record belongs to a configured publication, by the URI of
    /// its journal or by its own URL.
    fn is_in_publication_list(&self, record: &Metadata) -> bool {
        let journal_uri = record
            .get(RECORD_CITATION)
            .and_then(|citation| citation.get("journalName"))
            .and_then(|journal| journal.get("uri"))
            .and_then(Value::as_str);
        let own_url = record.get(RECORD_URL).and_then(Value::as_str);

        [journal_uri, own_url]
            .into_iter()
            .flatten()
            .any(|url| self.publication_list.iter().any(|listed| listed == url))
    }

    /// Fetches one page, pausing first. Failures are logged and yield `None`.
    async fn fetch_page(&self, url: &str) -> Option<String> {
        self.rate_limiter.acquire(url).await;
        info!(url, "processing url");
        match self.fetcher.fetch_text(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                error!(url, error = %e, "could not fetch url");
                None
            }
        }
    }

    /// All listing entries of `url`, following pagination.
    async fn fetch_listing(&self, url: &str) -> Vec<ListingEntry> {
        let mut entries = Vec::new();
        let mut pages = HashSet::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next.take() {
            if !pages.insert(page_url.clone()) {
                warn!(url = %page_url, "pagination loops back, stopping");
                break;
            }
            let Some(html) = self.fetch_page(&page_url).await else {
                break;
            };
            let page = parse_listing(&html, &self.base_url);
            entries.extend(page.entries);
            if let Some(next_url) = &page.next_page {
                info!(url = %next_url, "publication list continues on next page");
            }
            next = page.next_page;
        }

        entries
    }

    /// Listing of `url`, fetched at most once while it stays cached.
    async fn listing(
        &self,
        url: &str,
        cache: &mut HashMap<String, Vec<ListingEntry>>,
    ) -> Vec<ListingEntry> {
        if let Some(entries) = cache.get(url) {
            return entries.clone();
        }
        let entries = self.fetch_listing(url).await;
        cache.insert(url.to_string(), entries.clone());
        entries
    }

    async fn fetch_citation(&self, url: &str) -> Option<Citation> {
        let html = self.fetch_page(url).await?;
        let base = Url::parse(url).unwrap_or_else(|_| self.base_url.clone());
        let citation =
            extract_citation_from_html(&html, CITATION_CONTAINER_SELECTOR, &base, &self.classifier);
        match &citation {
            Some(citation) => debug!(url, title = %citation.title, "generated citation"),
            None => error!(url, "could not collect citation"),
        }
        citation
    }

    /// Turns the nodes of an article list into records.
    async fn collect_records(&self, entries: &[ListingEntry]) -> Vec<Metadata> {
        info!(items = entries.len(), "found items on article list");
        let mut records = Vec::new();

        for entry in entries {
            let Some(pdf_url) = &entry.pdf_url else {
                debug!(child = ?entry.child_url, "no publication link, skipping");
                continue;
            };
            let Some(citation_url) = &entry.citation_url else {
                warn!(pdf_url, "no citation url, skipping");
                continue;
            };
            let Some(id) = item_id_from_url(citation_url) else {
                warn!(url = %citation_url, "no item id in citation url, skipping");
                continue;
            };

            let citation = self
                .fetch_citation(citation_url)
                .await
                .map_or(Value::Null, |citation| Value::Object(citation.to_metadata()));

            let mut record = Metadata::new();
            record.insert(RECORD_ID.to_string(), json!(id));
            record.insert(RECORD_PDF_URL.to_string(), json!(pdf_url));
            record.insert(RECORD_CITATION.to_string(), citation);
            record.insert(RECORD_URL.to_string(), json!(citation_url));
            records.push(record);
        }

        records
    }
}

#[async_trait]
impl Adapter for ZobodatAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn folder_name(&self) -> &str {
        ZOBODAT_DATA_SOURCE
    }

    #[instrument(skip(self), fields(source = %self.config.name))]
    async fn discover(&self) -> Vec<Metadata> {
        let start_urls = self.start_urls();
        if self.config.crawl_all_items || self.publication_list.is_empty() {
            info!("start crawling all of zobodat");
        } else {
            info!(publications = ?start_urls, "crawling configured publications");
        }

        let mut cache = HashMap::new();
        let mut expanded = HashSet::new();
        let mut records = Vec::new();
        // Stack, so article lists are reached in page order.
        let mut worklist: Vec<String> = start_urls.into_iter().rev().collect();

        while let Some(url) = worklist.pop() {
            if !expanded.insert(url.clone()) {
                debug!(url, "already crawled");
                continue;
            }

            // An expanded page is never read again, so its listing leaves the cache.
            let entries = match cache.remove(&url) {
                Some(entries) => entries,
                None => self.fetch_listing(&url).await,
            };
            if entries.is_empty() {
                continue;
            }

            let mut deeper = Vec::new();
            for child in entries.iter().filter_map(|entry| entry.child_url.as_deref()) {
                // Expanded pages had a listing.
                if expanded.contains(child) || !self.listing(child, &mut cache).await.is_empty() {
                    deeper.push(child.to_string());
                }
            }

            if deeper.is_empty() {
                debug!(url, "is article list");
                records.extend(self.collect_records(&entries).await);
            } else {
                worklist.extend(deeper.into_iter().rev());
            }
        }

        records
    }

    fn populate(&self, item: &mut Item, mut record: Metadata) -> Result<(), ItemError> {
        let in_list = self.is_in_publication_list(&record);
        let id = record
            .remove(RECORD_ID)
            .and_then(|id| id.as_i64())
            .ok_or(ItemError::MissingId)?;
        debug!(id, "processing item");

        item.set_id(id)?;
        item.set_data_source(ZOBODAT_DATA_SOURCE);
        item.set_metadata_only(self.config.metadata_only || !in_list);

        if let Some(Value::String(pdf_url)) = record.remove(RECORD_PDF_URL) {
            item.add_text_file_url(&pdf_url, FileKind::Pdf);
        }
        if let Some(url) = record.get(RECORD_URL).and_then(Value::as_str) {
            item.set_source_url(url);
        }
        let citation = record.get(RECORD_CITATION).and_then(Value::as_object).cloned();

        item.add_metadata(COMPLETE_METADATA_KEY, Value::Object(record));
        if let Some(citation) = citation {
            item.set_document_metadata(citation);
        }
        Ok(())
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

/// Parses a listing page. Relative links resolve against `base`.
fn parse_listing(html: &str, base: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let entries = document
        .select(&LISTING_ENTRY)
        .map(|node| ListingEntry {
            child_url: first_href(node, &CHILD_LINK).and_then(|href| resolve(base, href)),
            pdf_url: first_href(node, &PUBLICATION_LINK).and_then(|href| resolve(base, href)),
            citation_url: citation_href(node).and_then(|href| resolve(base, href)),
        })
        .collect();
    let next_page = document
        .select(&NEXT_PAGE_LINK)
        .find_map(|link| link.value().attr("href"))
        .and_then(|href| {
            // Pagination links are bare query strings on the series page.
            if href.starts_with('?') {
                resolve(base, &format!("{LITERATURE_PATH}{href}"))
            } else {
                resolve(base, href)
            }
        });
    ListingPage { entries, next_page }
}

fn first_href<'a>(node: ElementRef<'a>, selector: &Selector) -> Option<&'a str> {
    node.select(selector).find_map(|element| element.value().attr("href"))
}

/// The first link of the last `div` inside the node's content block.
fn citation_href<'a>(node: ElementRef<'a>) -> Option<&'a str> {
    let content = node.select(&CONTENT).next()?;
    let last_div = content.select(&DIV).last().unwrap_or(content);
    first_href(last_div, &HYPERLINK)
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match base.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            warn!(href, error = %e, "malformed url");
            None
        }
    }
}

fn item_id_from_url(url: &str) -> Option<i64> {
    ITEM_ID_PATTERN
        .captures(url)
        .and_then(|captures| captures[1].parse().ok())
}
