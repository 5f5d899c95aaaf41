//! XML Schema and Schematron validation gateway.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::context::MetadataDialect;
use crate::errors::GatewayError;

/// A validation request for one metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRequest {
    /// The request URL, each path segment percent-encoded.
    pub url: Url,
    /// The same URL with the relative path left unencoded, for audit.
    pub display_uri: String,
}

impl SchemaRequest {
    /// Builds `{base}/{route}/{segments...}` for a file.
    ///
    /// `segments` is the file path relative to the data folder.
    pub fn for_file(
        base_url: &str,
        dialect: MetadataDialect,
        segments: &[String],
    ) -> Result<Self, GatewayError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| GatewayError::Request(format!("invalid base url '{base_url}': {e}")))?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::Request(format!("'{base_url}' cannot be a base")))?
            .pop_if_empty()
            .push(dialect.validation_route())
            .extend(segments);

        let display_uri = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            dialect.validation_route(),
            segments.join("/")
        );
        Ok(Self { url, display_uri })
    }
}

/// One Schematron finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SchematronFinding {
    /// The rule message.
    #[serde(default)]
    pub message: String,
}

/// One XML Schema finding.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaFinding {
    /// The validator message.
    #[serde(default)]
    pub message: String,
    /// Line number as reported.
    #[serde(default)]
    pub line: serde_json::Value,
    /// Column number as reported.
    #[serde(default)]
    pub col: serde_json::Value,
}

impl SchemaFinding {
    /// Renders `"<message>, Line: <line>, col: <col>"`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{}, Line: {}, col: {}",
            self.message,
            plain(&self.line),
            plain(&self.col)
        )
    }
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A report section holding an optional error list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportSection<E> {
    /// Findings; absent means none.
    #[serde(default = "Option::default")]
    pub errors: Option<Vec<E>>,
}

/// The validator response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    /// Schematron (business rule) findings.
    #[serde(default)]
    pub schematron_validation_report: Option<ReportSection<SchematronFinding>>,
    /// XML Schema findings.
    #[serde(default)]
    pub schema_validation_report: Option<ReportSection<SchemaFinding>>,
}

impl SchemaReport {
    /// Decodes a response body.
    ///
    /// A JSON `null` body is treated as a failed request.
    pub fn decode(url: &str, body: &str) -> Result<Self, GatewayError> {
        let report: Option<Self> =
            serde_json::from_str(body).map_err(|e| GatewayError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        report.ok_or_else(|| GatewayError::Decode {
            url: url.to_string(),
            message: "Metadata validation request failed!".to_string(),
        })
    }

    /// Every finding, Schematron first, then XML Schema.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let schematron = self
            .schematron_validation_report
            .iter()
            .filter_map(|s| s.errors.as_ref())
            .flatten()
            .map(|f| f.message.clone());
        let schema = self
            .schema_validation_report
            .iter()
            .filter_map(|s| s.errors.as_ref())
            .flatten()
            .map(SchemaFinding::render);
        schematron.chain(schema).collect()
    }
}

/// Validates a metadata file against the dialect's schema and Schematron rules.
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Runs the validation and returns the report.
    async fn validate(&self, request: &SchemaRequest) -> Result<SchemaReport, GatewayError>;
}

/// HTTP client for the XSLWeb validation service.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct XslWebSchemaGateway {
    http: reqwest::Client,
}

#[cfg(feature = "http")]
impl XslWebSchemaGateway {
    /// Creates a gateway with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway around an existing client.
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl SchemaValidator for XslWebSchemaGateway {
    async fn validate(&self, request: &SchemaRequest) -> Result<SchemaReport, GatewayError> {
        let response = self.http.get(request.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: request.display_uri.clone(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        SchemaReport::decode(&request.display_uri, &body)
    }
}
