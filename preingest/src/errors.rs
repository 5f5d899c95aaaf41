//! Error types for the preingest stages.
//!
//! Two layers exist: [`GatewayError`] describes a failed call to one of the
//! external validation services, [`PreingestError`] is what escapes a stage
//! body and turns the whole stage into a failure.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for stage-level failures.
#[derive(Debug, Error)]
pub enum PreingestError {
    /// The working folder of the collection does not exist.
    #[error("Working folder not found: {}", .0.display())]
    MissingWorkingFolder(PathBuf),

    /// A collaborator the stage depends on was not supplied.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),

    /// An external gateway failed outside of per-item evaluation.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// An XML document could not be parsed or written.
    #[error("XML error in {}: {message}", path.display())]
    Xml {
        /// The document that failed.
        path: PathBuf,
        /// Parser or writer message.
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Directory traversal failed.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A generic internal error, including panics caught in a stage body.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreingestError {
    /// Creates an XML error for a document.
    #[must_use]
    pub fn xml(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a missing collaborator error.
    #[must_use]
    pub fn missing_collaborator(name: impl Into<String>) -> Self {
        Self::MissingCollaborator(name.into())
    }
}

/// Errors raised by the external validation gateways.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request could not be built (bad URL, bad path).
    #[error("Invalid request: {0}")]
    Request(String),

    /// The service answered with a non-success status code.
    #[error("Failed to request data! Status code {status} for '{url}'")]
    Status {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from '{url}': {message}")]
    Decode {
        /// The requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// Transport-level failure.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure inside an in-process collaborator.
    #[error("{0}")]
    Collaborator(String),
}

impl GatewayError {
    /// Creates a collaborator failure.
    #[must_use]
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator(message.into())
    }
}

/// Renders the context chain of an `anyhow` error.
#[must_use]
pub fn anyhow_trace(err: &anyhow::Error) -> String {
    err.chain()
        .enumerate()
        .map(|(depth, cause)| {
            if depth == 0 {
                format!("error: {cause}")
            } else {
                format!("caused by: {cause}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the three-line failure message used for degraded items and failed stages.
#[must_use]
pub fn failure_lines(summary: impl Into<String>, err: &anyhow::Error) -> Vec<String> {
    vec![summary.into(), err.to_string(), anyhow_trace(err)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_missing_working_folder_display() {
        let err = PreingestError::MissingWorkingFolder(PathBuf::from("/data/abc"));
        assert_eq!(err.to_string(), "Working folder not found: /data/abc");
    }

    #[test]
    fn test_gateway_status_display() {
        let err = GatewayError::Status {
            url: "http://xslweb/topxvalidation/a".to_string(),
            status: 500,
        };
        assert!(err.to_string().contains("Status code 500"));
    }

    #[test]
    fn test_gateway_error_converts_to_preingest_error() {
        let err: PreingestError = GatewayError::collaborator("scanner offline").into();
        assert!(matches!(err, PreingestError::Gateway(_)));
        assert_eq!(err.to_string(), "scanner offline");
    }

    #[test]
    fn test_xml_error_names_document() {
        let err = PreingestError::xml("/data/a/a.opex", "expected OPEXMetadata");
        assert_eq!(err.to_string(), "XML error in /data/a/a.opex: expected OPEXMetadata");
    }

    #[test]
    fn test_failure_lines_has_three_entries() {
        let err = Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
            .context("loading record")
            .unwrap_err();

        let lines = failure_lines("Validation failed", &err);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Validation failed");
        assert_eq!(lines[1], "loading record");
        assert!(lines[2].contains("caused by: boom"));
    }
}
