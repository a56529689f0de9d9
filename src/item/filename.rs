//! File name derivation for item output.

use super::{FileKind, Item, ItemError};

impl Item {
    /// Derives the next unused file name for a file of `kind`.
    ///
    /// The first file of a kind is `{id}.{suffix}`; later ones of the same
    /// item become `{id}-1.{suffix}`, `{id}-2.{suffix}`, ... The whole suffix
    /// is kept, so a second character-OCR file is `{id}-1.html.gz`.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::MissingId`] if the item has no id yet.
    pub fn claim_file_name(&mut self, kind: FileKind) -> Result<String, ItemError> {
        let id = self.require_id()?;
        let suffix = kind.suffix();

        let mut file_name = format!("{id}.{suffix}");
        let mut counter = 1_u32;
        while self.created_file_names.contains(&file_name) {
            file_name = format!("{id}-{counter}.{suffix}");
            counter += 1;
        }

        self.created_file_names.insert(file_name.clone());
        Ok(file_name)
    }
}
