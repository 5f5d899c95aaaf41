//! Evaluation of one metadata file against every rule.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::item::MetadataValidationItem;
use super::openness::check_openness;
use super::printable::non_printable_findings;
use super::record::{MetadataRecord, RecordKind};
use super::temporal::check_restriction_periods;
use super::vocabulary::{check_all, declared_restrictions};
#[cfg(feature = "http")]
use crate::config::PreingestSettings;
use crate::context::{CollectionContext, MetadataDialect};
use crate::core::Confirmation;
use crate::errors::{failure_lines, GatewayError};
use crate::gateways::{BeperkingCategory, SchemaRequest, SchemaValidator, VocabularyLookup};
use crate::xml::XmlElement;

/// Evaluates metadata records.
///
/// Rules run in a fixed order, each appending to the item's messages:
/// schema, then (MDTO information objects) restriction periods and
/// vocabulary, then (ToPX file records) openness, then printable
/// characters. Only the schema and openness rules decide conformance.
#[derive(Clone)]
pub struct MetadataRuleEngine {
    xslweb_base_url: String,
    schema: Arc<dyn SchemaValidator>,
    vocabulary: Arc<dyn VocabularyLookup>,
    category: BeperkingCategory,
}

impl std::fmt::Debug for MetadataRuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRuleEngine")
            .field("xslweb_base_url", &self.xslweb_base_url)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl MetadataRuleEngine {
    /// Creates an engine over the given gateways.
    #[must_use]
    pub fn new(
        xslweb_base_url: impl Into<String>,
        schema: Arc<dyn SchemaValidator>,
        vocabulary: Arc<dyn VocabularyLookup>,
    ) -> Self {
        Self {
            xslweb_base_url: xslweb_base_url.into(),
            schema,
            vocabulary,
            category: BeperkingCategory::default(),
        }
    }

    /// Creates an engine talking to the services named in `settings`.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn from_settings(settings: &PreingestSettings) -> Self {
        use crate::gateways::{UtilitiesVocabularyGateway, XslWebSchemaGateway};

        let vocabulary = UtilitiesVocabularyGateway::new(settings.utilities_base_url())
            .with_timeout(settings.vocabulary_timeout());
        Self::new(
            settings.xslweb_base_url(),
            Arc::new(XslWebSchemaGateway::new()),
            Arc::new(vocabulary),
        )
    }

    /// Sets the vocabulary category restrictions are checked against.
    #[must_use]
    pub fn with_category(mut self, category: BeperkingCategory) -> Self {
        self.category = category;
        self
    }

    /// The vocabulary category in use.
    #[must_use]
    pub fn category(&self) -> BeperkingCategory {
        self.category
    }

    /// Evaluates one metadata file.
    ///
    /// Never fails: collaborator and parse errors degrade the returned item.
    pub async fn evaluate(&self, ctx: &CollectionContext, file: &Path) -> MetadataValidationItem {
        let request = ctx
            .relative_to_data_folder(file)
            .ok_or_else(|| {
                GatewayError::Request(format!(
                    "'{}' is not below the data folder '{}'",
                    file.display(),
                    ctx.data_folder.display()
                ))
            })
            .and_then(|segments| {
                SchemaRequest::for_file(&self.xslweb_base_url, ctx.dialect, &segments)
            });
        let request_uri = request
            .as_ref()
            .map_or_else(|_| file.display().to_string(), |r| r.display_uri.clone());

        let mut item = MetadataValidationItem::new(file, request_uri);
        self.check_schema(request, file, &mut item).await;

        let record = match MetadataRecord::load(file, ctx.dialect) {
            Ok(record) => record,
            Err(err) => {
                warn!(file = %file.display(), error = %err, "Metadata record could not be read");
                item.degrade(failure_lines(
                    format!("Failed to evaluate metadata rules for '{}'", file.display()),
                    &err,
                ));
                return item;
            }
        };

        match (ctx.dialect, record.kind()) {
            (MetadataDialect::Mdto, RecordKind::InformationObject) => {
                if let Some(object) = record.body() {
                    item.append(check_restriction_periods(object));
                    self.check_vocabulary(object, file, &mut item).await;
                }
            }
            (MetadataDialect::ToPX, RecordKind::File) => match check_openness(file, &record) {
                Ok(messages) => {
                    item.append(messages);
                    item.is_conformant_schema = item.error_messages.is_empty();
                }
                Err(err) => item.degrade(failure_lines(
                    format!("Openness check failed for '{}'", file.display()),
                    &err,
                )),
            },
            _ => {}
        }

        item.append(non_printable_findings(record.root()));
        debug!(
            file = %file.display(),
            accepted = item.is_accepted(),
            messages = item.error_messages.len(),
            "Metadata file evaluated"
        );
        item
    }

    async fn check_schema(
        &self,
        request: Result<SchemaRequest, GatewayError>,
        file: &Path,
        item: &mut MetadataValidationItem,
    ) {
        let result = match request {
            Ok(request) => self.schema.validate(&request).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(report) => {
                let messages = report.messages();
                item.is_validated = true;
                item.is_conformant_schema = messages.is_empty();
                item.append(messages);
            }
            Err(err) => {
                warn!(
                    file = %file.display(),
                    request_uri = %item.request_uri,
                    error = %err,
                    "Schema validation request failed"
                );
                item.is_validated = false;
                item.is_conformant_schema = false;
                let summary = format!(
                    "Exception occured in metadata validation with request '{}' for metadata file '{}'!",
                    item.request_uri,
                    file.display()
                );
                item.append(failure_lines(summary, &anyhow::Error::new(err)));
            }
        }
    }

    async fn check_vocabulary(
        &self,
        object: &XmlElement,
        file: &Path,
        item: &mut MetadataValidationItem,
    ) {
        let declared = declared_restrictions(object);
        if declared.is_empty() {
            return;
        }

        match self.vocabulary.terms(self.category).await {
            Ok(terms) => {
                let verdict = check_all(&declared, &terms);
                item.is_confirmed_vocabulary = verdict.confirmation;
                item.append(verdict.messages);
            }
            Err(err) => {
                let endpoint = self.vocabulary.endpoint(self.category);
                warn!(
                    file = %file.display(),
                    endpoint = %endpoint,
                    error = %err,
                    "Vocabulary lookup failed"
                );
                item.is_confirmed_vocabulary = Confirmation::Rejected;
                let summary = format!(
                    "Exception occured in metadata validation with request '{}' for metadata file '{}'!",
                    endpoint,
                    file.display()
                );
                item.append(failure_lines(summary, &anyhow::Error::new(err)));
            }
        }
    }
}
