//! Harvester Core Library
//!
//! This library provides the core functionality for the harvester tool,
//! which crawls biodiversity literature portals, extracts structured
//! citations, filters the discovered items by configurable rules and stores
//! their metadata and full texts.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - YAML harvest configuration and filter rule resolution
//! - [`download`] - HTTP fetching with streaming downloads and request pacing
//! - [`filter`] - Comparison predicates and the per-source filter engine
//! - [`harvester`] - Source adapters and the crawl, filter, write loop
//! - [`item`] - The harvested item model and its output writer
//! - [`parser`] - Citation extraction from literature pages

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod filter;
pub mod harvester;
pub mod item;
pub mod parser;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, FilterConfiguration, FilterRules, HarvestSettings, HarvesterConfig};
pub use download::{DownloadError, Fetcher, HttpClient, RateLimiter};
pub use filter::{ComparisonResult, Filter, FilterEngine, FilterError};
pub use harvester::{
    Adapter, AdapterRegistry, HarvestError, HarvestState, HarvestStats, Harvester,
    OutputOptions, ZobodatAdapter,
};
pub use item::{FileKind, Item, ItemError, Metadata};
pub use parser::{Citation, CitationFragment, LinkClassifier, MetadataElement, extract_citation};
