//! Lifecycle tests for the stage runner.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::context::{CollectionContext, MetadataDialect};
    use crate::core::{ResultValue, StageState};
    use crate::errors::{GatewayError, PreingestError};
    use crate::events::{CollectingEventSink, NoOpEventSink};
    use crate::gateways::{SchemaReport, SchemaRequest, SchemaValidator, StaticVocabulary};
    use crate::metadata::MetadataRuleEngine;
    use crate::stages::{run_stage, MetadataValidationStage, StageBody, StageProgress};

    /// Records numbers; odd numbers are rejected. Optionally fails or
    /// panics after recording everything.
    struct Numbers {
        values: Vec<u32>,
        fail: bool,
        panic: bool,
    }

    impl Numbers {
        fn new(values: Vec<u32>) -> Self {
            Self {
                values,
                fail: false,
                panic: false,
            }
        }
    }

    #[async_trait]
    impl StageBody for Numbers {
        type Item = u32;

        fn name(&self) -> &str {
            "Numbers"
        }

        fn started_description(&self, ctx: &CollectionContext) -> String {
            format!("Start numbers for '{}'.", ctx.collection)
        }

        fn completed_description(&self, _ctx: &CollectionContext) -> String {
            "Numbers done.".to_string()
        }

        fn failure_summary(&self, ctx: &CollectionContext) -> String {
            format!("Numbers for '{}' failed!", ctx.collection)
        }

        fn is_accepted(&self, item: &u32) -> bool {
            item % 2 == 0
        }

        async fn execute(
            &self,
            _ctx: &CollectionContext,
            progress: &mut StageProgress<'_, u32>,
        ) -> Result<(), PreingestError> {
            for value in &self.values {
                progress.record(*value, format!("Processing {value}")).await;
            }
            progress.add_message("all numbers seen");
            if self.panic {
                panic!("number overflow");
            }
            if self.fail {
                return Err(PreingestError::Internal("enumeration broke".to_string()));
            }
            Ok(())
        }
    }

    fn context() -> CollectionContext {
        CollectionContext::new(Uuid::nil(), "/data", "upload.tar", MetadataDialect::ToPX)
    }

    #[tokio::test]
    async fn test_successful_run_emits_started_executing_completed() {
        let sink = CollectingEventSink::new();

        let outcome = run_stage(&Numbers::new(vec![2, 3, 4]), &context(), &sink).await;

        assert_eq!(
            sink.states(),
            vec![
                StageState::Started,
                StageState::Executing,
                StageState::Executing,
                StageState::Executing,
                StageState::Completed,
            ]
        );
        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.result_value, ResultValue::Error);
        assert_eq!(outcome.messages, vec!["all numbers seen"]);

        let events = sink.events();
        assert_eq!(events[0].description, "Start numbers for 'upload.tar'.");
        assert_eq!(events[0].outcome.processed, 0);
        assert_eq!(events[2].description, "Processing 3");
        assert_eq!(events[4].description, "Numbers done.");
        assert_eq!(events[4].outcome.items.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_run_is_success() {
        let sink = CollectingEventSink::new();

        let outcome = run_stage(&Numbers::new(Vec::new()), &context(), &sink).await;

        assert_eq!(sink.states(), vec![StageState::Started, StageState::Completed]);
        assert!(outcome.is_success());
        assert_eq!(outcome.processed, 0);
    }

    #[tokio::test]
    async fn test_error_fails_stage_without_completed_event() {
        let sink = CollectingEventSink::new();
        let mut body = Numbers::new(vec![2, 4, 6]);
        body.fail = true;

        let outcome = run_stage(&body, &context(), &sink).await;

        assert_eq!(outcome.result_value, ResultValue::Failed);
        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.rejected, outcome.processed);
        assert_eq!(outcome.messages.len(), 4);
        assert_eq!(outcome.messages[0], "all numbers seen");
        assert_eq!(outcome.messages[1], "Numbers for 'upload.tar' failed!");
        assert_eq!(outcome.messages[2], "Internal error: enumeration broke");
        assert!(outcome.messages[3].starts_with("error: "));

        assert!(sink.events_in(StageState::Completed).is_empty());
        let failed = sink.events_in(StageState::Failed);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].description, "Numbers for 'upload.tar' failed!");
        assert_eq!(failed[0].outcome.rejected, 3);
    }

    #[tokio::test]
    async fn test_panic_in_body_fails_stage() {
        let sink = CollectingEventSink::new();
        let mut body = Numbers::new(vec![2]);
        body.panic = true;

        let outcome = run_stage(&body, &context(), &sink).await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.rejected, 1);
        assert!(outcome.messages[2].contains("number overflow"));
        assert_eq!(sink.states().last(), Some(&StageState::Failed));
    }

    #[tokio::test]
    async fn test_event_snapshots_are_not_mutated_later() {
        let sink = CollectingEventSink::new();

        run_stage(&Numbers::new(vec![2, 3]), &context(), &sink).await;

        let events = sink.events_in(StageState::Executing);
        assert_eq!(events[0].outcome.processed, 1);
        assert_eq!(events[0].outcome.items.len(), 1);
        assert_eq!(events[1].outcome.processed, 2);
    }

    #[test]
    fn test_rerun_starts_from_zero() {
        let body = Numbers::new(vec![1, 2]);
        let ctx = context();

        let first = tokio_test::block_on(run_stage(&body, &ctx, &NoOpEventSink));
        let second = tokio_test::block_on(run_stage(&body, &ctx, &NoOpEventSink));

        assert_eq!(first.processed, 2);
        assert_eq!(second.processed, 2);
        assert_eq!(second.items, vec![1, 2]);
    }

    /// Schema validator whose call for one file fails.
    struct FlakySchema {
        failing: &'static str,
    }

    #[async_trait]
    impl SchemaValidator for FlakySchema {
        async fn validate(&self, request: &SchemaRequest) -> Result<SchemaReport, GatewayError> {
            if request.display_uri.ends_with(self.failing) {
                return Err(GatewayError::Status {
                    url: request.display_uri.clone(),
                    status: 502,
                });
            }
            SchemaReport::decode(&request.display_uri, "{}")
        }
    }

    fn metadata_stage(failing: &'static str) -> MetadataValidationStage {
        MetadataValidationStage::new(MetadataRuleEngine::new(
            "http://xslweb:8000",
            Arc::new(FlakySchema { failing }),
            Arc::new(StaticVocabulary::new(Vec::new())),
        ))
    }

    const DOSSIER: &str = r#"<ToPX xmlns="http://www.nationaalarchief.nl/ToPX/v2.3"><aggregatie><naam>Dossier</naam><aggregatieniveau>Dossier</aggregatieniveau></aggregatie></ToPX>"#;

    #[tokio::test]
    async fn test_metadata_stage_degrades_one_item_and_completes() {
        let data = tempfile::tempdir().unwrap();
        let ctx = CollectionContext::new(Uuid::new_v4(), data.path(), "upload.tar", MetadataDialect::ToPX);
        for n in 0..10 {
            let folder = ctx.session_folder().join(format!("Dossier {n}"));
            fs::create_dir_all(&folder).unwrap();
            fs::write(folder.join(format!("Dossier {n}.metadata")), DOSSIER).unwrap();
        }
        let sink = CollectingEventSink::new();

        let outcome = run_stage(&metadata_stage("Dossier 4.metadata"), &ctx, &sink).await;

        assert_eq!(sink.states().last(), Some(&StageState::Completed));
        assert_eq!(sink.events_in(StageState::Executing).len(), 10);
        assert_eq!(outcome.processed, 10);
        assert_eq!(outcome.accepted, 9);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.result_value, ResultValue::Error);

        let degraded: Vec<_> = outcome.items.iter().filter(|i| !i.is_validated).collect();
        assert_eq!(degraded.len(), 1);
        assert!(degraded[0].filename.ends_with("Dossier 4.metadata"));
        assert_eq!(degraded[0].error_messages.len(), 3);
        assert!(outcome
            .items
            .iter()
            .filter(|i| i.is_validated)
            .all(|i| i.is_conformant_schema && i.error_messages.is_empty()));
        assert_eq!(
            sink.events()[1].description,
            format!(
                "Processing file '{}'",
                ctx.session_folder().join("Dossier 0").join("Dossier 0.metadata").display()
            )
        );
    }

    #[tokio::test]
    async fn test_metadata_stage_without_working_folder_fails() {
        let ctx = CollectionContext::new(
            Uuid::new_v4(),
            "/definitely/not/here",
            "upload.tar",
            MetadataDialect::Mdto,
        );
        let sink = CollectingEventSink::new();

        let outcome = run_stage(&metadata_stage("none"), &ctx, &sink).await;

        assert_eq!(sink.states(), vec![StageState::Started, StageState::Failed]);
        assert!(outcome.is_failed());
        assert_eq!(outcome.processed, 0);
        assert_eq!(
            outcome.messages[0],
            "An exception occured in metadata validation!"
        );
        assert!(outcome.messages[1].starts_with("Working folder not found"));
    }
}
