//! Format identification inventory collaborator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::context::{CollectionContext, MetadataDialect};
use crate::errors::GatewayError;

/// Kind of an inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// A regular file.
    File,
    /// A folder.
    Folder,
    /// A container such as a zip archive.
    Container,
}

/// One identified entry of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRecord {
    /// Absolute location.
    pub location: PathBuf,
    /// File name.
    pub name: String,
    /// Extension without the dot, as found.
    #[serde(default)]
    pub extension: String,
    /// Entry type.
    pub entry_type: EntryType,
    /// Identified format name.
    #[serde(default)]
    pub format_name: String,
    /// Identified format version.
    #[serde(default)]
    pub format_version: String,
    /// PRONOM identifier.
    #[serde(default)]
    pub puid: String,
    /// True if the extension does not match the identified format.
    #[serde(default)]
    pub is_extension_mismatch: bool,
}

impl FormatRecord {
    /// Creates a file record, deriving name and extension from the path.
    #[must_use]
    pub fn file(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let name = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = location
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            location,
            name,
            extension,
            entry_type: EntryType::File,
            format_name: String::new(),
            format_version: String::new(),
            puid: String::new(),
            is_extension_mismatch: false,
        }
    }

    /// True for files that are not metadata sidecars of `dialect`.
    #[must_use]
    pub fn is_content_file(&self, dialect: MetadataDialect) -> bool {
        self.entry_type == EntryType::File && !dialect.is_metadata_file(&self.location)
    }
}

/// Supplies the format identification results of a collection.
pub trait FormatInventory: Send + Sync {
    /// Returns every identified entry of the collection.
    fn records(&self, ctx: &CollectionContext) -> Result<Vec<FormatRecord>, GatewayError>;
}
