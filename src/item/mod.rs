//! Harvested items: identity, files to fetch and metadata.
//!
//! An [`Item`] is filled in by a source adapter, judged once by the
//! [`FilterEngine`](crate::filter::FilterEngine) and then written once by the
//! output functions in [`output`]. File names inside the output tree are
//! derived from the item id, so the id must be set before anything is
//! written.

mod error;
mod filename;
pub mod output;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

pub use error::ItemError;

/// Free-form metadata attached to an item.
pub type Metadata = Map<String, Value>;

/// Metadata key holding the copyright statement of a document.
pub const COPYRIGHT_STATUS_KEY: &str = "CopyrightStatus";

/// Metadata key holding a license URL.
pub const LICENSE_URL_KEY: &str = "LicenseUrl";

const CREATIVE_COMMONS_MARKER: &str = "//creativecommons.org/licenses";

/// Kinds of files an item can reference or be serialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    /// Portable document format.
    Pdf,
    /// Plain text.
    Txt,
    /// XML document.
    Xml,
    /// JSON document.
    Json,
    /// Gzipped ABBYY OCR output.
    Abbyy,
    /// Gzipped character-level OCR HTML.
    Chocr,
}

impl FileKind {
    /// File name suffix, without the leading dot.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Abbyy => "gz",
            Self::Chocr => "html.gz",
        }
    }

    /// Folder below `text/` that files of this kind are stored in.
    #[must_use]
    pub fn folder_name(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Abbyy => "abbyy",
            Self::Chocr => "chocr",
        }
    }

    /// Upper-case name used in serialized metadata.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "TXT",
            Self::Xml => "XML",
            Self::Json => "JSON",
            Self::Abbyy => "ABBYY",
            Self::Chocr => "CHOCR",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Copyright classification derived from an item's document metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyrightStatus {
    /// Default when nothing indicates otherwise.
    InCopyright,
    /// Marked `not_in_copyright` or public domain.
    NotInCopyright,
    /// Published under a Creative Commons license.
    CreativeCommons,
}

/// A single harvested bibliographic item.
#[derive(Debug, Clone)]
pub struct Item {
    id: Option<i64>,
    data_source: String,
    source_url: Option<Url>,
    files: Vec<(Url, FileKind)>,
    metadata: Metadata,
    document_metadata: Option<Metadata>,
    metadata_only: bool,
    created_file_names: HashSet<String>,
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

impl Item {
    /// Creates an empty item. Items are metadata-only until an adapter
    /// decides otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: None,
            data_source: String::new(),
            source_url: None,
            files: Vec::new(),
            metadata: Metadata::new(),
            document_metadata: None,
            metadata_only: true,
            created_file_names: HashSet::new(),
        }
    }

    /// The source-scoped id, if assigned.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Assigns the item id.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::IdAlreadySet`] if the item already has an id.
    pub fn set_id(&mut self, id: i64) -> Result<(), ItemError> {
        match self.id {
            Some(existing) => Err(ItemError::IdAlreadySet {
                existing,
                requested: id,
            }),
            None => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// The item id, required for anything that derives file names.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::MissingId`] if no id has been assigned.
    pub fn require_id(&self) -> Result<i64, ItemError> {
        self.id.ok_or(ItemError::MissingId)
    }

    /// Tag of the adapter that produced this item.
    #[must_use]
    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Sets the producing adapter's tag.
    pub fn set_data_source(&mut self, data_source: impl Into<String>) {
        self.data_source = data_source.into();
    }

    /// Landing page of the item on its source site.
    #[must_use]
    pub fn source_url(&self) -> Option<&Url> {
        self.source_url.as_ref()
    }

    /// Sets the landing page. Malformed URLs are logged and ignored.
    pub fn set_source_url(&mut self, url: &str) {
        match Url::parse(url) {
            Ok(parsed) => self.source_url = Some(parsed),
            Err(e) => warn!(url = %url, error = %e, "ignoring malformed item URL"),
        }
    }

    /// Files queued for download, in insertion order.
    #[must_use]
    pub fn files(&self) -> &[(Url, FileKind)] {
        &self.files
    }

    /// Queues a file for download.
    ///
    /// Returns `false` when the URL is malformed (logged) or already queued.
    pub fn add_text_file_url(&mut self, url: &str, kind: FileKind) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(url = %url, error = %e, "dropping malformed file URL");
                return false;
            }
        };

        if self.files.iter().any(|(existing, _)| *existing == parsed) {
            debug!(url = %parsed, "file URL already queued");
            return false;
        }

        self.files.push((parsed, kind));
        true
    }

    /// Full item metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Sets `key` in the item metadata, replacing any previous value.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Appends `value` to the array stored under `list_name`, creating it if
    /// needed. A non-array value already stored there becomes the first
    /// element.
    pub fn add_metadata_to_array(&mut self, list_name: &str, value: impl Into<Value>) {
        let entry = self
            .metadata
            .entry(list_name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            let previous = entry.take();
            *entry = Value::Array(vec![previous]);
        }
        if let Value::Array(values) = entry {
            values.push(value.into());
        }
    }

    /// Metadata describing the document itself (authors, year, title).
    /// Falls back to the full metadata when no adapter set it.
    #[must_use]
    pub fn document_metadata(&self) -> &Metadata {
        self.document_metadata.as_ref().unwrap_or(&self.metadata)
    }

    /// Replaces the document metadata.
    pub fn set_document_metadata(&mut self, document_metadata: Metadata) {
        self.document_metadata = Some(document_metadata);
    }

    /// Whether only metadata, and no files, should be written.
    #[must_use]
    pub fn is_metadata_only(&self) -> bool {
        self.metadata_only
    }

    /// Sets the metadata-only flag.
    pub fn set_metadata_only(&mut self, metadata_only: bool) {
        self.metadata_only = metadata_only;
    }

    /// Classifies the document's copyright from its metadata.
    ///
    /// A Creative Commons license URL wins over any copyright statement.
    #[must_use]
    pub fn copyright_status(&self) -> CopyrightStatus {
        let metadata = self.document_metadata();

        if metadata
            .get(LICENSE_URL_KEY)
            .and_then(Value::as_str)
            .is_some_and(|url| url.contains(CREATIVE_COMMONS_MARKER))
        {
            return CopyrightStatus::CreativeCommons;
        }

        match metadata.get(COPYRIGHT_STATUS_KEY).and_then(Value::as_str) {
            Some(status)
                if status.eq_ignore_ascii_case("not_in_copyright")
                    || status.to_lowercase().contains("public domain") =>
            {
                CopyrightStatus::NotInCopyright
            }
            _ => CopyrightStatus::InCopyright,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_item_defaults() {
        let item = Item::new();
        assert_eq!(item.id(), None);
        assert!(item.is_metadata_only());
        assert!(item.files().is_empty());
        assert!(matches!(item.require_id(), Err(ItemError::MissingId)));
    }

    #[test]
    fn test_set_id_only_once() {
        let mut item = Item::new();
        item.set_id(42).unwrap();
        let err = item.set_id(43).unwrap_err();
        assert!(matches!(
            err,
            ItemError::IdAlreadySet {
                existing: 42,
                requested: 43
            }
        ));
        assert_eq!(item.require_id().unwrap(), 42);
    }

    #[test]
    fn test_add_text_file_url_dedups_and_drops_malformed() {
        let mut item = Item::new();
        assert!(item.add_text_file_url("https://example.org/a.pdf", FileKind::Pdf));
        assert!(!item.add_text_file_url("https://example.org/a.pdf", FileKind::Txt));
        assert!(!item.add_text_file_url("not a url", FileKind::Pdf));
        assert!(item.add_text_file_url("https://example.org/a.txt", FileKind::Txt));

        let kinds: Vec<FileKind> = item.files().iter().map(|(_, kind)| *kind).collect();
        assert_eq!(kinds, vec![FileKind::Pdf, FileKind::Txt]);
    }

    #[test]
    fn test_document_metadata_falls_back_to_metadata() {
        let mut item = Item::new();
        item.add_metadata("year", 1900);
        assert_eq!(item.document_metadata().get("year"), Some(&json!(1900)));

        let mut document = Metadata::new();
        document.insert("year".into(), json!(2001));
        item.set_document_metadata(document);
        assert_eq!(item.document_metadata().get("year"), Some(&json!(2001)));
        assert_eq!(item.metadata().get("year"), Some(&json!(1900)));
    }

    #[test]
    fn test_add_metadata_to_array_appends() {
        let mut item = Item::new();
        item.add_metadata_to_array("Authors", "Ada");
        item.add_metadata_to_array("Authors", "Grace");
        assert_eq!(item.metadata().get("Authors"), Some(&json!(["Ada", "Grace"])));

        item.add_metadata("Scalar", "first");
        item.add_metadata_to_array("Scalar", "second");
        assert_eq!(item.metadata().get("Scalar"), Some(&json!(["first", "second"])));
    }

    #[test]
    fn test_copyright_status_classification() {
        let mut item = Item::new();
        assert_eq!(item.copyright_status(), CopyrightStatus::InCopyright);

        item.add_metadata(COPYRIGHT_STATUS_KEY, "NOT_IN_COPYRIGHT");
        assert_eq!(item.copyright_status(), CopyrightStatus::NotInCopyright);

        item.add_metadata(COPYRIGHT_STATUS_KEY, "This work is in the Public Domain.");
        assert_eq!(item.copyright_status(), CopyrightStatus::NotInCopyright);

        item.add_metadata(LICENSE_URL_KEY, "https://creativecommons.org/licenses/by/4.0/");
        assert_eq!(item.copyright_status(), CopyrightStatus::CreativeCommons);
    }

    #[test]
    fn test_creative_commons_without_status_statement() {
        let mut item = Item::new();
        item.add_metadata(LICENSE_URL_KEY, "http://creativecommons.org/licenses/by-nc/3.0/");
        assert_eq!(item.copyright_status(), CopyrightStatus::CreativeCommons);
    }

    #[test]
    fn test_file_kind_suffix_and_folder() {
        assert_eq!(FileKind::Abbyy.suffix(), "gz");
        assert_eq!(FileKind::Chocr.suffix(), "html.gz");
        assert_eq!(FileKind::Chocr.folder_name(), "chocr");
        assert_eq!(FileKind::Pdf.to_string(), "PDF");
    }
}
