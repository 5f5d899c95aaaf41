//! Controlled-vocabulary lookup gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "http")]
use std::time::Duration;

use crate::errors::GatewayError;

/// A restriction term: a `(code, label)` pair from a controlled vocabulary.
///
/// Equality is an exact, case-sensitive match on code and label; the
/// definition is informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Beperking {
    /// `begripCode`.
    #[serde(rename = "begripCode", default)]
    pub code: String,
    /// `begripLabel`.
    #[serde(rename = "begripLabel", default)]
    pub label: String,
    /// `definitie`.
    #[serde(rename = "definitie", default)]
    pub definition: Option<String>,
}

impl Beperking {
    /// Creates a term without definition.
    #[must_use]
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            definition: None,
        }
    }
}

impl PartialEq for Beperking {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.label == other.label
    }
}

impl Eq for Beperking {}

impl fmt::Display for Beperking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "begripCode={}, begripLabel={}", self.code, self.label)
    }
}

/// Vocabulary lists published by the utilities service.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeperkingCategory {
    IntellectueleEigendomCreativeCommonsLicenties,
    IntellectueleEigendomDatabankwet,
    IntellectueleEigendomRightsStatements,
    IntellectueleEigendomSoftwareLicenties,
    IntellectueleEigendomWetOpDeNaburigeRechten,
    #[default]
    #[serde(rename = "OPENBAARHEID_ARCHIEFWET_1995")]
    OpenbaarheidArchiefwet1995,
    #[serde(rename = "OPENBAARHEID_ARCHIEFWET_2021")]
    OpenbaarheidArchiefwet2021,
    OpenbaarheidWetOpenOverheid,
    PersoonsgegevensAvg,
    Triggers,
    Voorkeursformaten,
}

impl BeperkingCategory {
    /// The enumerant as used in the lookup URL.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntellectueleEigendomCreativeCommonsLicenties => {
                "INTELLECTUELE_EIGENDOM_CREATIVE_COMMONS_LICENTIES"
            }
            Self::IntellectueleEigendomDatabankwet => "INTELLECTUELE_EIGENDOM_DATABANKWET",
            Self::IntellectueleEigendomRightsStatements => "INTELLECTUELE_EIGENDOM_RIGHTS_STATEMENTS",
            Self::IntellectueleEigendomSoftwareLicenties => {
                "INTELLECTUELE_EIGENDOM_SOFTWARE_LICENTIES"
            }
            Self::IntellectueleEigendomWetOpDeNaburigeRechten => {
                "INTELLECTUELE_EIGENDOM_WET_OP_DE_NABURIGE_RECHTEN"
            }
            Self::OpenbaarheidArchiefwet1995 => "OPENBAARHEID_ARCHIEFWET_1995",
            Self::OpenbaarheidArchiefwet2021 => "OPENBAARHEID_ARCHIEFWET_2021",
            Self::OpenbaarheidWetOpenOverheid => "OPENBAARHEID_WET_OPEN_OVERHEID",
            Self::PersoonsgegevensAvg => "PERSOONSGEGEVENS_AVG",
            Self::Triggers => "TRIGGERS",
            Self::Voorkeursformaten => "VOORKEURSFORMATEN",
        }
    }
}

impl fmt::Display for BeperkingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up the terms of a vocabulary category.
#[async_trait]
pub trait VocabularyLookup: Send + Sync {
    /// Where the list for `category` is fetched from, for diagnostics.
    fn endpoint(&self, category: BeperkingCategory) -> String;

    /// Fetches the term list.
    async fn terms(&self, category: BeperkingCategory) -> Result<Vec<Beperking>, GatewayError>;
}

/// HTTP client for `GET {base}/begrippenlijst/{CATEGORY}`.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct UtilitiesVocabularyGateway {
    base_url: String,
    timeout: Option<Duration>,
    http: reqwest::Client,
}

#[cfg(feature = "http")]
impl UtilitiesVocabularyGateway {
    /// Creates a gateway for a utilities base URL, without a timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            http: reqwest::Client::new(),
        }
    }

    /// Bounds each lookup.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl VocabularyLookup for UtilitiesVocabularyGateway {
    fn endpoint(&self, category: BeperkingCategory) -> String {
        format!(
            "{}/begrippenlijst/{}",
            self.base_url.trim_end_matches('/'),
            category
        )
    }

    async fn terms(&self, category: BeperkingCategory) -> Result<Vec<Beperking>, GatewayError> {
        let url = self.endpoint(category);
        let mut request = self.http.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

/// An in-memory term list.
#[derive(Debug, Clone, Default)]
pub struct StaticVocabulary {
    terms: Vec<Beperking>,
}

impl StaticVocabulary {
    /// Creates a lookup answering every category with `terms`.
    #[must_use]
    pub fn new(terms: Vec<Beperking>) -> Self {
        Self { terms }
    }
}

#[async_trait]
impl VocabularyLookup for StaticVocabulary {
    fn endpoint(&self, category: BeperkingCategory) -> String {
        format!("static://begrippenlijst/{category}")
    }

    async fn terms(&self, _category: BeperkingCategory) -> Result<Vec<Beperking>, GatewayError> {
        Ok(self.terms.clone())
    }
}
