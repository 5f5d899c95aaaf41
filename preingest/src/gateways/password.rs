//! Password protection inspection collaborator.

use std::path::Path;

use crate::errors::GatewayError;

/// Extensions of documents that can carry a password.
pub const CANDIDATE_EXTENSIONS: [&str; 17] = [
    "doc", "xls", "ppt", "docx", "xlsx", "pptx", "pdf", "docm", "dotx", "dotm", "xlsm", "xltx",
    "xlsb", "xlam", "pptm", "ppsx", "ppsm",
];

/// Container family of a candidate document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// PDF; inspected for a password only.
    Pdf,
    /// Word, Excel or PowerPoint; inspected and scanned for macros.
    Office,
}

impl DocumentKind {
    /// Classifies an extension, case-insensitively.
    ///
    /// Returns `None` for documents that are not checked.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if !CANDIDATE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }
        if extension == "pdf" {
            Some(Self::Pdf)
        } else {
            Some(Self::Office)
        }
    }
}

/// Decides whether a document is password protected.
pub trait PasswordInspector: Send + Sync {
    /// Inspects the document at `path`.
    fn is_password_protected(&self, path: &Path, kind: DocumentKind)
        -> Result<bool, GatewayError>;
}
