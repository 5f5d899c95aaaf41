//! Metadata dialects and record enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::PreingestError;

const TOPX_EXTENSION: &str = "metadata";
const MDTO_SUFFIX: &str = ".mdto.xml";

/// The metadata standard a collection is described in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataDialect {
    /// ToPX: one `<name>.metadata` sidecar per file and folder.
    #[serde(rename = "ToPX")]
    ToPX,
    /// MDTO: one `<name>.mdto.xml` sidecar per information object.
    #[serde(rename = "MDTO")]
    Mdto,
}

impl fmt::Display for MetadataDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToPX => write!(f, "ToPX"),
            Self::Mdto => write!(f, "MDTO"),
        }
    }
}

impl MetadataDialect {
    /// Route prefix of the schema validation service for this dialect.
    #[must_use]
    pub fn validation_route(&self) -> &'static str {
        match self {
            Self::ToPX => "topxvalidation",
            Self::Mdto => "mdtovalidation",
        }
    }

    /// True if `path` is a metadata file in this dialect.
    #[must_use]
    pub fn is_metadata_file(&self, path: &Path) -> bool {
        match self {
            Self::ToPX => path
                .extension()
                .is_some_and(|ext| ext == TOPX_EXTENSION),
            Self::Mdto => path
                .file_name()
                .map(|n| n.to_string_lossy().to_ascii_lowercase())
                .is_some_and(|n| n.ends_with(MDTO_SUFFIX)),
        }
    }

    /// Detects the dialect of a folder tree: MDTO if any `.mdto.xml` file
    /// exists, ToPX otherwise.
    pub fn detect(folder: &Path) -> Result<Self, PreingestError> {
        for entry in WalkDir::new(folder) {
            let entry = entry?;
            if entry.file_type().is_file() && Self::Mdto.is_metadata_file(entry.path()) {
                return Ok(Self::Mdto);
            }
        }
        Ok(Self::ToPX)
    }

    /// Lists every metadata file below `folder`, sorted by path.
    pub fn metadata_files(&self, folder: &Path) -> Result<Vec<PathBuf>, PreingestError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(folder) {
            let entry = entry?;
            if entry.file_type().is_file() && self.is_metadata_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}
