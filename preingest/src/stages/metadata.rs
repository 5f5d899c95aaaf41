//! Metadata validation stage.

use async_trait::async_trait;
use tracing::info;

use super::{StageBody, StageProgress};
use crate::context::CollectionContext;
use crate::errors::PreingestError;
use crate::metadata::{MetadataRuleEngine, MetadataValidationItem};

/// Validates every metadata file of the collection, in path order.
#[derive(Debug, Clone)]
pub struct MetadataValidationStage {
    engine: MetadataRuleEngine,
}

impl MetadataValidationStage {
    /// Creates the stage around a rule engine.
    #[must_use]
    pub fn new(engine: MetadataRuleEngine) -> Self {
        Self { engine }
    }

    /// The rule engine in use.
    #[must_use]
    pub fn engine(&self) -> &MetadataRuleEngine {
        &self.engine
    }
}

#[async_trait]
impl StageBody for MetadataValidationStage {
    type Item = MetadataValidationItem;

    fn name(&self) -> &str {
        "MetadataValidation"
    }

    fn started_description(&self, _ctx: &CollectionContext) -> String {
        "Start validate .metadata files.".to_string()
    }

    fn completed_description(&self, _ctx: &CollectionContext) -> String {
        "Validation is done!".to_string()
    }

    fn failure_summary(&self, _ctx: &CollectionContext) -> String {
        "An exception occured in metadata validation!".to_string()
    }

    fn is_accepted(&self, item: &MetadataValidationItem) -> bool {
        item.is_accepted()
    }

    async fn execute(
        &self,
        ctx: &CollectionContext,
        progress: &mut StageProgress<'_, MetadataValidationItem>,
    ) -> Result<(), PreingestError> {
        let folder = ctx.working_folder()?;
        let files = ctx.dialect.metadata_files(&folder)?;
        info!(
            session_id = %ctx.session_id,
            dialect = %ctx.dialect,
            count = files.len(),
            "Validating metadata files"
        );

        for file in files {
            let item = self.engine.evaluate(ctx, &file).await;
            progress
                .record(item, format!("Processing file '{}'", file.display()))
                .await;
        }
        Ok(())
    }
}
