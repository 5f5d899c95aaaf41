//! Per-file result of the metadata validation stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::Confirmation;

/// Validation result for one metadata file.
///
/// `error_messages` is append-only: later rules add findings, they never
/// remove earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataValidationItem {
    /// Absolute path of the metadata file.
    pub filename: PathBuf,
    /// The validation service URL, decoded, for audit.
    pub request_uri: String,
    /// True if the schema gateway call succeeded.
    pub is_validated: bool,
    /// True if the record conforms to schema and structural rules.
    pub is_conformant_schema: bool,
    /// Controlled-vocabulary confirmation; `Unknown` when not applicable.
    pub is_confirmed_vocabulary: Confirmation,
    /// Findings of every rule, in evaluation order.
    #[serde(default)]
    pub error_messages: Vec<String>,
}

impl MetadataValidationItem {
    /// Creates an item for a file before any rule has run.
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>, request_uri: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            request_uri: request_uri.into(),
            is_validated: false,
            is_conformant_schema: false,
            is_confirmed_vocabulary: Confirmation::Unknown,
            error_messages: Vec::new(),
        }
    }

    /// Appends findings.
    pub fn append<I, S>(&mut self, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_messages.extend(messages.into_iter().map(Into::into));
    }

    /// Marks the item as non-conformant and appends the diagnostic lines.
    pub fn degrade(&mut self, lines: Vec<String>) {
        self.is_conformant_schema = false;
        self.error_messages.extend(lines);
    }

    /// The metadata stage's accept predicate.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.is_validated && self.is_conformant_schema
    }
}
