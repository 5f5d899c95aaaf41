//! Password protection and macro detection stage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{StageBody, StageProgress};
use crate::context::CollectionContext;
use crate::errors::{failure_lines, PreingestError};
use crate::gateways::{DocumentKind, FormatInventory, FormatRecord, MacroScanner, PasswordInspector};

const PROTECTED_FOUND: &str = "Er zijn bestanden met wachtwoord beveiliging gevonden.";
const NOT_CHECKED_HEADER: &str = "Deze bestanden worden niet gecontroleerd op wachtwoord beveiliging:";

/// Result of inspecting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordDetectionItem {
    /// The inspected document.
    pub file: PathBuf,
    /// True if the document is password protected.
    pub is_protected: bool,
    /// True if the macro scanner found macros.
    pub has_macros: bool,
    /// False when the inspection itself failed.
    pub is_checked: bool,
    /// Diagnostics of a failed inspection.
    pub messages: Vec<String>,
}

impl PasswordDetectionItem {
    fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            is_protected: false,
            has_macros: false,
            is_checked: true,
            messages: Vec::new(),
        }
    }

    /// True if the document was inspected and carries no password.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.is_checked && !self.is_protected
    }
}

/// Inspects the PDF and Office documents of a collection for password
/// protection, and the Office documents for macros.
///
/// Documents come from the format inventory; metadata sidecars are skipped.
#[derive(Clone, Default)]
pub struct PasswordDetectionStage {
    inventory: Option<Arc<dyn FormatInventory>>,
    inspector: Option<Arc<dyn PasswordInspector>>,
    macro_scanner: Option<Arc<dyn MacroScanner>>,
}

impl std::fmt::Debug for PasswordDetectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordDetectionStage")
            .field("has_inventory", &self.inventory.is_some())
            .field("has_inspector", &self.inspector.is_some())
            .field("has_macro_scanner", &self.macro_scanner.is_some())
            .finish()
    }
}

impl PasswordDetectionStage {
    /// Creates a stage without collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the format inventory.
    #[must_use]
    pub fn with_inventory(mut self, inventory: Arc<dyn FormatInventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Sets the password inspector.
    #[must_use]
    pub fn with_inspector(mut self, inspector: Arc<dyn PasswordInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Sets the macro scanner. Without one, no document reports macros.
    #[must_use]
    pub fn with_macro_scanner(mut self, scanner: Arc<dyn MacroScanner>) -> Self {
        self.macro_scanner = Some(scanner);
        self
    }

    async fn inspect(
        &self,
        inspector: &Arc<dyn PasswordInspector>,
        record: &FormatRecord,
        kind: DocumentKind,
    ) -> PasswordDetectionItem {
        let mut item = PasswordDetectionItem::new(&record.location);

        let worker = Arc::clone(inspector);
        let path = record.location.clone();
        let inspected =
            tokio::task::spawn_blocking(move || worker.is_password_protected(&path, kind)).await;
        let outcome = match inspected {
            Ok(result) => result.map_err(anyhow::Error::new),
            Err(join) => Err(anyhow::Error::new(join)),
        };

        match outcome {
            Ok(protected) => item.is_protected = protected,
            Err(err) => {
                warn!(file = %record.location.display(), error = %err, "Password inspection failed");
                item.is_checked = false;
                item.messages = failure_lines(
                    format!(
                        "Exception occured in password detection for file '{}'!",
                        record.location.display()
                    ),
                    &err,
                );
                return item;
            }
        }

        if kind == DocumentKind::Office {
            item.has_macros = self.has_macros(record).await;
        }
        item
    }

    async fn has_macros(&self, record: &FormatRecord) -> bool {
        let Some(scanner) = &self.macro_scanner else {
            return false;
        };
        match scanner.scan(&record.location).await {
            Ok(report) => report.has_macros(),
            Err(err) => {
                warn!(file = %record.location.display(), error = %err, "Macro scan failed");
                false
            }
        }
    }
}

#[async_trait]
impl StageBody for PasswordDetectionStage {
    type Item = PasswordDetectionItem;

    fn name(&self) -> &str {
        "PasswordDetection"
    }

    fn started_description(&self, ctx: &CollectionContext) -> String {
        format!(
            "Start detection for files with password protection for container '{}'.",
            ctx.collection
        )
    }

    fn completed_description(&self, _ctx: &CollectionContext) -> String {
        "Password protection detection run with a collection is done.".to_string()
    }

    fn failure_summary(&self, ctx: &CollectionContext) -> String {
        format!(
            "Running detection for files with password protection with collection: '{}' failed!",
            ctx.collection
        )
    }

    fn is_accepted(&self, item: &PasswordDetectionItem) -> bool {
        item.is_accepted()
    }

    async fn execute(
        &self,
        ctx: &CollectionContext,
        progress: &mut StageProgress<'_, PasswordDetectionItem>,
    ) -> Result<(), PreingestError> {
        ctx.working_folder()?;
        let inventory = self
            .inventory
            .as_ref()
            .ok_or_else(|| PreingestError::missing_collaborator("format inventory"))?;
        let inspector = self
            .inspector
            .as_ref()
            .ok_or_else(|| PreingestError::missing_collaborator("password inspector"))?;

        let (candidates, skipped): (Vec<_>, Vec<_>) = inventory
            .records(ctx)?
            .into_iter()
            .filter(|record| record.is_content_file(ctx.dialect))
            .map(|record| (DocumentKind::from_extension(&record.extension), record))
            .partition(|(kind, _)| kind.is_some());
        info!(
            session_id = %ctx.session_id,
            candidates = candidates.len(),
            skipped = skipped.len(),
            "Detecting password protection"
        );

        for (kind, record) in candidates {
            let Some(kind) = kind else { continue };
            debug!(file = %record.location.display(), ?kind, "Inspecting document");
            let item = self.inspect(inspector, &record, kind).await;
            progress
                .record(item, format!("Processing file '{}'", record.location.display()))
                .await;
        }

        if progress.outcome().items.iter().any(|item| !item.is_accepted()) {
            progress.add_message(PROTECTED_FOUND);
        }
        if !skipped.is_empty() {
            progress.add_message(NOT_CHECKED_HEADER);
            for (_, record) in skipped {
                progress.add_message(record.location.display().to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MetadataDialect;
    use crate::core::{ResultValue, StageState};
    use crate::errors::GatewayError;
    use crate::events::CollectingEventSink;
    use crate::gateways::{MacroFinding, MacroReport, MockMacroScanner};
    use crate::stages::run_stage;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use uuid::Uuid;

    struct FixedInventory(Vec<FormatRecord>);

    impl FormatInventory for FixedInventory {
        fn records(&self, _ctx: &CollectionContext) -> Result<Vec<FormatRecord>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    struct NameInspector;

    impl PasswordInspector for NameInspector {
        fn is_password_protected(
            &self,
            path: &Path,
            _kind: DocumentKind,
        ) -> Result<bool, GatewayError> {
            let name = path.to_string_lossy();
            if name.contains("broken") {
                return Err(GatewayError::collaborator("unreadable container"));
            }
            Ok(name.contains("secret"))
        }
    }

    fn collection() -> (tempfile::TempDir, CollectionContext) {
        let data = tempfile::tempdir().unwrap();
        let ctx = CollectionContext::new(
            Uuid::new_v4(),
            data.path(),
            "upload.tar",
            MetadataDialect::ToPX,
        );
        std::fs::create_dir_all(ctx.session_folder()).unwrap();
        (data, ctx)
    }

    fn inventory(ctx: &CollectionContext, names: &[&str]) -> Arc<FixedInventory> {
        Arc::new(FixedInventory(
            names
                .iter()
                .map(|name| FormatRecord::file(ctx.session_folder().join(name)))
                .collect(),
        ))
    }

    #[tokio::test]
    async fn test_detects_protected_documents_and_macros() {
        let (_data, ctx) = collection();
        let mut scanner = MockMacroScanner::new();
        scanner
            .expect_scan()
            .withf(|path: &Path| path.ends_with("macro.docm"))
            .times(1)
            .returning(|_| {
                Ok(MacroReport {
                    analyze_macros: vec![MacroFinding {
                        kind: "AutoExec".to_string(),
                        keyword: "AutoOpen".to_string(),
                        description: "runs on open".to_string(),
                    }],
                })
            });
        scanner
            .expect_scan()
            .withf(|path: &Path| !path.ends_with("macro.docm"))
            .returning(|_| Ok(MacroReport::default()));
        let stage = PasswordDetectionStage::new()
            .with_inventory(inventory(
                &ctx,
                &["a.pdf", "secret.docx", "macro.docm", "notes.txt", "a.pdf.metadata"],
            ))
            .with_inspector(Arc::new(NameInspector))
            .with_macro_scanner(Arc::new(scanner));
        let sink = CollectingEventSink::new();

        let outcome = run_stage(&stage, &ctx, &sink).await;

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.result_value, ResultValue::Error);
        assert!(outcome.items[1].is_protected);
        assert!(outcome.items[2].has_macros);
        assert!(!outcome.items[0].has_macros);
        assert_eq!(
            outcome.messages,
            vec![
                PROTECTED_FOUND.to_string(),
                NOT_CHECKED_HEADER.to_string(),
                ctx.session_folder().join("notes.txt").display().to_string(),
            ]
        );
        assert_eq!(sink.states().last(), Some(&StageState::Completed));
    }

    #[tokio::test]
    async fn test_macro_scan_failure_counts_as_no_macros() {
        let (_data, ctx) = collection();
        let mut scanner = MockMacroScanner::new();
        scanner
            .expect_scan()
            .returning(|_| Err(GatewayError::collaborator("scanner offline")));
        let stage = PasswordDetectionStage::new()
            .with_inventory(inventory(&ctx, &["sheet.xlsm"]))
            .with_inspector(Arc::new(NameInspector))
            .with_macro_scanner(Arc::new(scanner));

        let outcome = run_stage(&stage, &ctx, &CollectingEventSink::new()).await;

        assert!(outcome.is_success());
        assert!(!outcome.items[0].has_macros);
        assert!(outcome.messages.is_empty());
    }

    #[tokio::test]
    async fn test_pdf_is_not_scanned_for_macros() {
        let (_data, ctx) = collection();
        let mut scanner = MockMacroScanner::new();
        scanner.expect_scan().never();
        let stage = PasswordDetectionStage::new()
            .with_inventory(inventory(&ctx, &["report.PDF"]))
            .with_inspector(Arc::new(NameInspector))
            .with_macro_scanner(Arc::new(scanner));

        let outcome = run_stage(&stage, &ctx, &CollectingEventSink::new()).await;

        assert_eq!(outcome.processed, 1);
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_inspector_failure_degrades_item() {
        let (_data, ctx) = collection();
        let stage = PasswordDetectionStage::new()
            .with_inventory(inventory(&ctx, &["broken.pdf", "fine.pdf"]))
            .with_inspector(Arc::new(NameInspector));

        let outcome = run_stage(&stage, &ctx, &CollectingEventSink::new()).await;

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.rejected, 1);
        let degraded = &outcome.items[0];
        assert!(!degraded.is_checked);
        assert_eq!(degraded.messages.len(), 3);
        assert_eq!(degraded.messages[1], "unreadable container");
        assert_eq!(outcome.messages, vec![PROTECTED_FOUND.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_inventory_fails_stage() {
        let (_data, ctx) = collection();
        let stage = PasswordDetectionStage::new().with_inspector(Arc::new(NameInspector));
        let sink = CollectingEventSink::new();

        let outcome = run_stage(&stage, &ctx, &sink).await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.messages.len(), 3);
        assert_eq!(
            outcome.messages[0],
            "Running detection for files with password protection with collection: 'upload.tar' failed!"
        );
        assert_eq!(outcome.messages[1], "Missing collaborator: format inventory");
        assert_eq!(sink.states(), vec![StageState::Started, StageState::Failed]);
    }
}
