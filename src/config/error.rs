//! Error types for harvest configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::filter::FilterError;

/// Errors raised while reading the harvest configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file or an id list file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML or does not match the expected shape.
    #[error("invalid configuration YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// An entry of the `Harvesters` list is malformed.
    #[error("invalid harvester entry #{index}: {reason}")]
    InvalidHarvesterEntry {
        /// Zero-based position in the `Harvesters` list.
        index: usize,
        /// What was wrong with the entry.
        reason: String,
    },

    /// The `ItemFilter` section could not be turned into rules.
    #[error("invalid item filter configuration: {0}")]
    Filter(#[from] FilterError),
}

impl ConfigError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid harvester entry error.
    pub fn invalid_entry(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidHarvesterEntry {
            index,
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml { source }
    }
}
