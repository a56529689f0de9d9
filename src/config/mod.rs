//! Harvest configuration.
//!
//! A YAML file with three sections:
//!
//! ```yaml
//! General:
//!   output-path: /data/harvest
//!   request-delay: 500        # milliseconds before every crawl request
//!   logging-level: info
//!   overwrite: true
//!   metadata-format: xml      # or json
//! Harvesters:
//!   - Zobodat:
//!       class: zobodat
//!       metadata-only: false
//!       crawl-all-items: false
//!       titles: [7392]        # or a path to a file with one id per line
//!       items: items.txt
//! ItemFilter:
//!   General:
//!     year: { equalless: 1923 }
//! ```
//!
//! Per-harvester `request-delay` and `overwrite` fall back to the `General`
//! values. Relative id list paths resolve against the configuration file's
//! directory.

mod error;
mod filter_rules;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, instrument};

pub use error::ConfigError;
pub use filter_rules::{FilterConfiguration, FilterRules, GENERAL_RULES_KEY, STRICT_KEY};

use crate::filter::FilterError;
use crate::item::FileKind;

/// Default for `overwrite` when neither the harvester nor `General` sets it.
pub const DEFAULT_OVERWRITE: bool = true;

/// Serialization format of metadata files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataFormat {
    /// XML with a `Metadata` root element.
    #[default]
    #[serde(alias = "XML")]
    Xml,
    /// JSON with two-space indentation.
    #[serde(alias = "JSON")]
    Json,
}

impl MetadataFormat {
    /// The file kind written for this format.
    #[must_use]
    pub fn file_kind(self) -> FileKind {
        match self {
            Self::Xml => FileKind::Xml,
            Self::Json => FileKind::Json,
        }
    }
}

/// The `General` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneralSettings {
    /// Root of the output tree. Each source writes below its own folder.
    pub output_path: PathBuf,
    /// Default pause before every crawl request, in milliseconds.
    #[serde(default)]
    pub request_delay: u64,
    /// Default log level when neither `RUST_LOG` nor `-v`/`-q` is given.
    #[serde(default)]
    pub logging_level: Option<String>,
    /// Default for replacing existing files.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
    /// Metadata file format.
    #[serde(default)]
    pub metadata_format: MetadataFormat,
}

fn default_overwrite() -> bool {
    DEFAULT_OVERWRITE
}

/// Resolved settings of one configured harvester.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvesterConfig {
    /// Name under `Harvesters`, also the key for its filter rules.
    pub name: String,
    /// Adapter kind, looked up in the adapter registry.
    pub kind: String,
    /// Never download files, only write metadata.
    pub metadata_only: bool,
    /// Crawl the whole site instead of the listed items and titles.
    pub crawl_all_items: bool,
    /// Pause before every crawl request.
    pub request_delay: Duration,
    /// Replace files that already exist.
    pub overwrite: bool,
    /// Ids of series/journals to crawl.
    pub titles: Vec<String>,
    /// Ids of single articles to crawl.
    pub items: Vec<String>,
}

impl HarvesterConfig {
    /// Creates a configuration with defaults: no ids, no delay, overwrite on.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            metadata_only: false,
            crawl_all_items: false,
            request_delay: Duration::ZERO,
            overwrite: DEFAULT_OVERWRITE,
            titles: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// The complete, resolved harvest configuration.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// The `General` section.
    pub general: GeneralSettings,
    /// Harvesters in configuration order.
    pub harvesters: Vec<HarvesterConfig>,
    /// Filter rules from the `ItemFilter` section.
    pub filter_rules: FilterRules,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(rename = "General")]
    general: GeneralSettings,
    #[serde(rename = "Harvesters", default)]
    harvesters: Vec<serde_yaml::Mapping>,
    #[serde(rename = "ItemFilter", default)]
    item_filter: serde_yaml::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawHarvesterConfig {
    class: String,
    #[serde(default)]
    metadata_only: bool,
    #[serde(default)]
    crawl_all_items: bool,
    request_delay: Option<u64>,
    overwrite: Option<bool>,
    titles: Option<IdList>,
    items: Option<IdList>,
}

/// Either inline ids or the path of a file holding one id per line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdList {
    Single(i64),
    Inline(Vec<IdEntry>),
    File(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdEntry {
    Number(i64),
    Text(String),
}

impl HarvestSettings {
    /// Reads and resolves a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file or a referenced id list cannot be
    /// read, the YAML is invalid, or `ItemFilter` is not a mapping of source
    /// names. A malformed rule group is reported per source by
    /// [`HarvestSettings::filter_rules_for`].
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("reading configuration");
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&raw, base_dir)
    }

    /// Parses configuration text. Relative id list paths resolve against
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// See [`HarvestSettings::load`].
    pub fn from_yaml_str(raw: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let settings: RawSettings = serde_yaml::from_str(raw)?;

        let filter_tree = serde_json::to_value(&settings.item_filter)
            .map_err(|e| FilterError::malformed("ItemFilter", e.to_string()))?;
        let filter_rules = FilterRules::parse(&filter_tree)?;

        let harvesters = settings
            .harvesters
            .into_iter()
            .enumerate()
            .map(|(index, entry)| resolve_harvester(index, entry, &settings.general, base_dir))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(harvesters = harvesters.len(), "configuration resolved");
        Ok(Self {
            general: settings.general,
            harvesters,
            filter_rules,
        })
    }

    /// Looks up a harvester by its configured name.
    #[must_use]
    pub fn harvester_config(&self, name: &str) -> Option<&HarvesterConfig> {
        self.harvesters.iter().find(|config| config.name == name)
    }

    /// Filter rules that apply to the named harvester.
    ///
    /// # Errors
    ///
    /// Returns the [`FilterError`] of the rule
    /// section the harvester resolves to when that section is malformed.
    pub fn filter_rules_for(
        &self,
        name: &str,
    ) -> Result<&[FilterConfiguration], FilterError> {
        self.filter_rules.rules_for(name)
    }
}

fn resolve_harvester(
    index: usize,
    entry: serde_yaml::Mapping,
    general: &GeneralSettings,
    base_dir: &Path,
) -> Result<HarvesterConfig, ConfigError> {
    if entry.len() != 1 {
        return Err(ConfigError::invalid_entry(
            index,
            format!("expected exactly one harvester name, found {}", entry.len()),
        ));
    }
    let Some((name, body)) = entry.into_iter().next() else {
        return Err(ConfigError::invalid_entry(index, "empty entry"));
    };
    let Some(name) = name.as_str().map(str::to_string) else {
        return Err(ConfigError::invalid_entry(index, "harvester name must be a string"));
    };

    let raw: RawHarvesterConfig = serde_yaml::from_value(body)
        .map_err(|e| ConfigError::invalid_entry(index, format!("{name}: {e}")))?;

    Ok(HarvesterConfig {
        kind: raw.class,
        metadata_only: raw.metadata_only,
        crawl_all_items: raw.crawl_all_items,
        request_delay: Duration::from_millis(raw.request_delay.unwrap_or(general.request_delay)),
        overwrite: raw.overwrite.unwrap_or(general.overwrite),
        titles: resolve_ids(raw.titles, base_dir)?,
        items: resolve_ids(raw.items, base_dir)?,
        name,
    })
}

fn resolve_ids(list: Option<IdList>, base_dir: &Path) -> Result<Vec<String>, ConfigError> {
    let ids = match list {
        None => Vec::new(),
        Some(IdList::Single(id)) => vec![id.to_string()],
        Some(IdList::Inline(entries)) => entries
            .into_iter()
            .map(|entry| match entry {
                IdEntry::Number(id) => id.to_string(),
                IdEntry::Text(id) => id,
            })
            .collect(),
        Some(IdList::File(file)) => {
            let path = base_dir.join(&file);
            debug!(path = %path.display(), "reading id list");
            std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::io(&path, e))?
                .lines()
                .map(str::to_string)
                .collect()
        }
    };

    Ok(ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}
