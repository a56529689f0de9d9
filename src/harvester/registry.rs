//! Adapter registry keyed by the configured harvester kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::{Adapter, HarvestError, ZobodatAdapter};
use crate::config::HarvesterConfig;
use crate::download::Fetcher;

/// Builds an adapter for one configured source.
pub type AdapterFactory =
    fn(&HarvesterConfig, Arc<dyn Fetcher>) -> Result<Box<dyn Adapter>, HarvestError>;

/// Maps adapter kinds (the `class` key of a harvester entry) to constructors.
///
/// Kinds are matched ignoring case. [`AdapterRegistry::default`] registers
/// every built-in adapter.
#[derive(Clone)]
pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AdapterRegistry {
    /// Creates a registry without adapters.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers `factory` for `kind`, replacing an earlier registration.
    pub fn register(&mut self, kind: &str, factory: AdapterFactory) {
        debug!(kind, "registering adapter");
        self.factories.insert(kind.to_ascii_lowercase(), factory);
    }

    /// Registered kinds, lowercase and sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Whether an adapter is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(&kind.to_ascii_lowercase())
    }

    /// Builds the adapter for a configured source.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::UnknownAdapter`] if no adapter is registered
    /// for the source's kind, or whatever the adapter's constructor returns.
    pub fn create(
        &self,
        config: &HarvesterConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Box<dyn Adapter>, HarvestError> {
        let factory = self
            .factories
            .get(&config.kind.to_ascii_lowercase())
            .ok_or_else(|| HarvestError::unknown_adapter(&config.name, &config.kind))?;
        factory(config, fetcher)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("zobodat", create_zobodat);
        registry
    }
}

#[allow(clippy::unnecessary_wraps)]
fn create_zobodat(
    config: &HarvesterConfig,
    fetcher: Arc<dyn Fetcher>,
) -> Result<Box<dyn Adapter>, HarvestError> {
    Ok(Box::new(ZobodatAdapter::new(config.clone(), fetcher)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;

    use super::*;
    use crate::download::DownloadError;

    struct NoFetcher;

    #[async_trait]
    impl Fetcher for NoFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
            Err(DownloadError::invalid_url(url))
        }

        async fn download_to_path(&self, url: &str, _path: &Path) -> Result<u64, DownloadError> {
            Err(DownloadError::invalid_url(url))
        }
    }

    #[test]
    fn test_default_registers_zobodat() {
        let registry = AdapterRegistry::default();
        assert_eq!(registry.kinds(), vec!["zobodat"]);
        assert!(registry.contains("Zobodat"));
        assert!(registry.contains("ZOBODAT"));
    }

    #[test]
    fn test_create_is_case_insensitive() {
        let registry = AdapterRegistry::default();
        let config = HarvesterConfig::new("Zobodat", "ZoBoDaT");
        let adapter = registry.create(&config, Arc::new(NoFetcher)).unwrap();
        assert_eq!(adapter.name(), "Zobodat");
        assert_eq!(adapter.folder_name(), "Zobodat");
    }

    #[test]
    fn test_unknown_kind() {
        let registry = AdapterRegistry::empty();
        let config = HarvesterConfig::new("Zobodat", "zobodat");
        let error = registry.create(&config, Arc::new(NoFetcher)).err().unwrap();
        assert!(matches!(
            error,
            HarvestError::UnknownAdapter { ref kind, .. } if kind == "zobodat"
        ));
    }

    #[test]
    fn test_debug_lists_kinds() {
        let debug = format!("{:?}", AdapterRegistry::default());
        assert!(debug.contains("zobodat"));
    }
}
