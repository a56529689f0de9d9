//! Error types for setting up and running source harvesters.

use thiserror::Error;
use url::ParseError;

use crate::filter::FilterError;

/// Errors raised while building a harvester for a configured source.
///
/// Crawl-time failures (unreachable pages, missing citation containers) are
/// not errors: they are logged and yield no records.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// No adapter is registered for the configured kind.
    #[error("unknown harvester kind '{kind}' for source '{source_name}'")]
    UnknownAdapter {
        /// Configured source name.
        source_name: String,
        /// Adapter kind from the `class` key.
        kind: String,
    },

    /// The source's filter rules cannot be turned into filters.
    #[error("invalid filter for source '{source_name}': {source}")]
    Filter {
        /// Configured source name.
        source_name: String,
        /// The underlying filter error.
        #[source]
        source: FilterError,
    },

    /// The adapter's base URL is unusable.
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: ParseError,
    },
}

impl HarvestError {
    /// Creates an unknown adapter error.
    pub fn unknown_adapter(source_name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownAdapter {
            source_name: source_name.into(),
            kind: kind.into(),
        }
    }

    /// Creates a filter error for a source.
    pub fn filter(source_name: impl Into<String>, source: FilterError) -> Self {
        Self::Filter {
            source_name: source_name.into(),
            source,
        }
    }

    /// Creates an invalid base URL error.
    pub fn invalid_base_url(url: impl Into<String>, source: ParseError) -> Self {
        Self::InvalidBaseUrl {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_adapter_display() {
        let error = HarvestError::unknown_adapter("Biodiversity", "bhl");
        let message = error.to_string();
        assert!(message.contains("'bhl'"));
        assert!(message.contains("'Biodiversity'"));
    }

    #[test]
    fn test_filter_error_keeps_source() {
        use std::error::Error as _;
        let error = HarvestError::filter("Zobodat", FilterError::unknown_predicate("around"));
        assert!(error.source().is_some());
        assert!(error.to_string().contains("Zobodat"));
    }
}
