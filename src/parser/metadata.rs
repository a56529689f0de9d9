//! Labelled bibliographic entities (authors, journals, issues).

use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};
use url::Url;

/// A named entity, optionally linked to a canonical page.
///
/// Identity is the label: two elements with the same label are equal
/// whatever their URIs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataElement {
    label: String,
    #[serde(serialize_with = "serialize_uri")]
    uri: Option<Url>,
}

impl MetadataElement {
    /// Creates an element. The label is trimmed; an unparseable URI is
    /// dropped.
    #[must_use]
    pub fn new(label: &str, uri: Option<&str>) -> Self {
        Self {
            label: label.trim().to_string(),
            uri: uri.and_then(|uri| Url::parse(uri).ok()),
        }
    }

    /// Creates an element without a URI.
    #[must_use]
    pub fn unlinked(label: &str) -> Self {
        Self::new(label, None)
    }

    /// The display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The linked page, if any.
    #[must_use]
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// Whether the label is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }
}

impl PartialEq for MetadataElement {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for MetadataElement {}

impl Hash for MetadataElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

fn serialize_uri<S: Serializer>(uri: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error> {
    uri.as_ref().map(Url::as_str).serialize(serializer)
}
