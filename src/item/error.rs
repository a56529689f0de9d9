//! Error types for item assembly and output.

use std::path::PathBuf;

use thiserror::Error;

use super::FileKind;

/// Errors raised while assembling an item or writing it to disk.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The item already carries an id; ids are assigned exactly once.
    #[error("item id already set to {existing}, refusing to overwrite with {requested}")]
    IdAlreadySet {
        /// Id the item already has.
        existing: i64,
        /// Id that was rejected.
        requested: i64,
    },

    /// A file path was requested before the item received an id.
    #[error("item has no id; file names cannot be derived")]
    MissingId,

    /// Metadata cannot be serialized in the requested format.
    #[error("unsupported metadata output format {kind:?}, expected Xml or Json")]
    UnsupportedOutputFormat {
        /// The rejected format.
        kind: FileKind,
    },

    /// Serializing metadata failed.
    #[error("failed to serialize metadata: {message}")]
    Serialization {
        /// Serializer error message.
        message: String,
    },

    /// File system error while writing output.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ItemError {
    /// Creates a serialization error from any displayable serializer error.
    pub fn serialization(error: impl std::fmt::Display) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
