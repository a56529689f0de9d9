//! Writing items to the local store.
//!
//! Layout below a source's output folder:
//!
//! ```text
//! {folder}/metadata/{id}.xml            (or .json)
//! {folder}/text/{kind}/{id}.{suffix}    (one per queued file)
//! ```

use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::{FileKind, Item, ItemError};
use crate::download::Fetcher;

/// Root element of XML metadata documents.
pub const METADATA_ROOT_NAME: &str = "Metadata";

/// Folder holding serialized metadata.
pub const METADATA_FOLDER_NAME: &str = "metadata";

/// Folder holding downloaded files, one subfolder per [`FileKind`].
pub const TEXT_FOLDER_NAME: &str = "text";

const ITEM_ID_KEY: &str = "itemID";
const URL_KEY: &str = "Url";
const SOURCE_KEY: &str = "Source";
const TEXT_URLS_KEY: &str = "TextUrls";
const TEXT_URL_KEY: &str = "TextUrl";
const FILE_TYPE_KEY: &str = "Filetype";

const JSON_INDENT: &[u8] = b"  ";

impl Item {
    /// Serializes the full item metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::UnsupportedOutputFormat`] for anything but
    /// [`FileKind::Xml`] and [`FileKind::Json`], or
    /// [`ItemError::Serialization`] if the serializer fails.
    pub fn metadata_as_string(&self, format: FileKind) -> Result<String, ItemError> {
        match format {
            FileKind::Xml => metadata_to_xml(self.metadata()),
            FileKind::Json => metadata_to_json(self.metadata()),
            other => Err(ItemError::UnsupportedOutputFormat { kind: other }),
        }
    }

    /// Writes the item metadata to `{output_dir}/metadata/{id}.{xml|json}`.
    ///
    /// The item id, URL, source tag and queued file list are added to the
    /// metadata first.
    ///
    /// # Errors
    ///
    /// Fails if the item has no id, the format is unsupported, or the file
    /// cannot be written.
    #[instrument(skip(self, output_dir), fields(id = ?self.id(), format = %format))]
    pub async fn write_metadata_file(
        &mut self,
        output_dir: &Path,
        format: FileKind,
    ) -> Result<PathBuf, ItemError> {
        let id = self.require_id()?;
        self.add_item_fields_to_metadata(id);
        let content = self.metadata_as_string(format)?;

        let directory = output_dir.join(METADATA_FOLDER_NAME);
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| ItemError::io(&directory, e))?;

        let path = directory.join(format!("{id}.{}", format.suffix()));
        debug!(path = %path.display(), "writing metadata");
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ItemError::io(&path, e))?;

        Ok(path)
    }

    /// Downloads every queued file into `{output_dir}/text/{kind}/`.
    ///
    /// Returns the paths written. Nothing is fetched for metadata-only items.
    /// Existing files are left alone unless `overwrite` is set. A failed
    /// download is logged and the next file is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::MissingId`] if files are queued but the item has
    /// no id. Download failures are not errors.
    #[instrument(
        skip(self, output_dir, fetcher),
        fields(id = ?self.id(), files = self.files().len())
    )]
    pub async fn write_text_files(
        &mut self,
        output_dir: &Path,
        overwrite: bool,
        fetcher: &dyn Fetcher,
    ) -> Result<Vec<PathBuf>, ItemError> {
        if self.is_metadata_only() || self.files().is_empty() {
            return Ok(Vec::new());
        }

        let text_dir = output_dir.join(TEXT_FOLDER_NAME);
        let files = self.files().to_vec();
        let mut written = Vec::new();
        let mut failed = 0_usize;

        for (url, kind) in &files {
            let directory = text_dir.join(kind.folder_name());
            let path = directory.join(self.claim_file_name(*kind)?);

            if !overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
                info!(path = %path.display(), "file exists, skipping");
                continue;
            }

            if let Err(e) = tokio::fs::create_dir_all(&directory).await {
                warn!(path = %directory.display(), error = %e, "cannot create output folder");
                failed += 1;
                continue;
            }

            info!(url = %url, path = %path.display(), "downloading file");
            match fetcher.download_to_path(url.as_str(), &path).await {
                Ok(bytes) => {
                    debug!(bytes, path = %path.display(), "download done");
                    written.push(path);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "download failed, continuing with next file");
                    failed += 1;
                }
            }
        }

        if failed == files.len() {
            error!(id = ?self.id(), "all file downloads of item failed");
        }

        Ok(written)
    }

    fn add_item_fields_to_metadata(&mut self, id: i64) {
        self.add_metadata(ITEM_ID_KEY, id);
        match self.source_url().map(ToString::to_string) {
            Some(url) => self.add_metadata(URL_KEY, url),
            None => {
                self.metadata.remove(URL_KEY);
            }
        }
        let source = self.data_source().to_string();
        self.add_metadata(SOURCE_KEY, source);

        let text_urls: Vec<Value> = self
            .files()
            .iter()
            .map(|(url, kind)| {
                let mut entry = Map::new();
                entry.insert(URL_KEY.to_string(), Value::String(url.to_string()));
                entry.insert(FILE_TYPE_KEY.to_string(), Value::String(kind.label().to_string()));
                Value::Object(entry)
            })
            .collect();
        let mut list = Map::new();
        list.insert(TEXT_URL_KEY.to_string(), Value::Array(text_urls));
        self.add_metadata(TEXT_URLS_KEY, Value::Object(list));
    }
}

fn metadata_to_json(metadata: &Map<String, Value>) -> Result<String, ItemError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    serde::Serialize::serialize(metadata, &mut serializer).map_err(ItemError::serialization)?;
    String::from_utf8(buffer).map_err(ItemError::serialization)
}

fn metadata_to_xml(metadata: &Map<String, Value>) -> Result<String, ItemError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Start(BytesStart::new(METADATA_ROOT_NAME)))
        .map_err(ItemError::serialization)?;
    write_xml_fields(&mut writer, metadata)?;
    writer
        .write_event(Event::End(BytesEnd::new(METADATA_ROOT_NAME)))
        .map_err(ItemError::serialization)?;
    String::from_utf8(writer.into_inner()).map_err(ItemError::serialization)
}

fn write_xml_fields(
    writer: &mut Writer<Vec<u8>>,
    fields: &Map<String, Value>,
) -> Result<(), ItemError> {
    for (key, value) in fields {
        let name = xml_element_name(key);
        match value {
            Value::Array(values) => {
                for element in values {
                    write_xml_element(writer, &name, element)?;
                }
            }
            other => write_xml_element(writer, &name, other)?,
        }
    }
    Ok(())
}

fn write_xml_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), ItemError> {
    let text = match value {
        Value::Null => {
            return writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(ItemError::serialization);
        }
        Value::Object(fields) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(ItemError::serialization)?;
            write_xml_fields(writer, fields)?;
            return writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(ItemError::serialization);
        }
        // Nested arrays flatten into repeated elements.
        Value::Array(values) => {
            for element in values {
                write_xml_element(writer, name, element)?;
            }
            return Ok(());
        }
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
    };

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(ItemError::serialization)?;
    writer
        .write_event(Event::Text(BytesText::new(&text)))
        .map_err(ItemError::serialization)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(ItemError::serialization)
}

/// Maps a metadata key onto a valid XML element name.
fn xml_element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
    {
        name.insert(0, '_');
    }
    name
}
