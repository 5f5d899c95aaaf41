//! Office macro scanning gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::GatewayError;

/// One macro analysis finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroFinding {
    /// Finding type, e.g. `AutoExec`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// The matched keyword.
    #[serde(default)]
    pub keyword: String,
    /// Explanation.
    #[serde(default)]
    pub description: String,
}

/// The analysis part of a scan response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroReport {
    /// Macro findings; empty when the document has none.
    #[serde(default)]
    pub analyze_macros: Vec<MacroFinding>,
}

impl MacroReport {
    /// True if the scanner reported any macro.
    #[must_use]
    pub fn has_macros(&self) -> bool {
        !self.analyze_macros.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct MacroScanEnvelope {
    result: Option<MacroReport>,
}

impl MacroReport {
    /// Decodes a `{"result": {"analyzeMacros": [...]}}` response.
    pub fn decode(url: &str, body: &str) -> Result<Self, GatewayError> {
        let envelope: MacroScanEnvelope =
            serde_json::from_str(body).map_err(|e| GatewayError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        envelope.result.ok_or_else(|| GatewayError::Decode {
            url: url.to_string(),
            message: "response has no result".to_string(),
        })
    }
}

/// Scans an Office document for macros.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MacroScanner: Send + Sync {
    /// Scans the document at `path`.
    async fn scan(&self, path: &Path) -> Result<MacroReport, GatewayError>;
}

/// HTTP client for `POST {base}/utilities/scan_for_macros/{base64(path)}`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct UtilitiesMacroScanner {
    base_url: String,
    http: reqwest::Client,
}

#[cfg(feature = "http")]
impl UtilitiesMacroScanner {
    /// Creates a scanner for a utilities base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// The scan URL for a document.
    #[must_use]
    pub fn scan_url(&self, path: &Path) -> String {
        use base64::Engine as _;

        let encoded = base64::engine::general_purpose::STANDARD
            .encode(path.to_string_lossy().as_bytes());
        format!(
            "{}/utilities/scan_for_macros/{}",
            self.base_url.trim_end_matches('/'),
            encoded
        )
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl MacroScanner for UtilitiesMacroScanner {
    async fn scan(&self, path: &Path) -> Result<MacroReport, GatewayError> {
        let url = self.scan_url(path);
        let response = self.http.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        MacroReport::decode(&url, &body)
    }
}
