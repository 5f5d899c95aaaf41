//! OPEX build and revert stages.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{StageBody, StageProgress};
use crate::context::{CollectionContext, MetadataDialect};
use crate::errors::{failure_lines, PreingestError};
use crate::opex::{FileKind, Manifest, ManifestFile, OpexMetadata, OPEX_EXTENSION};

fn is_opex_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == OPEX_EXTENSION)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Result of writing the sidecar of one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpexBuildItem {
    /// The sidecar, `<folder>/<folderName>.opex`.
    pub opex_file: PathBuf,
    /// Number of files in the manifest.
    pub files: usize,
    /// Number of sub-folders in the manifest.
    pub folders: usize,
    /// True once the sidecar is on disk.
    pub is_written: bool,
    /// Diagnostics of a failed write.
    pub messages: Vec<String>,
}

/// Writes an OPEX sidecar for every folder of the collection, the root
/// included.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpexBuildStage;

impl OpexBuildStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn manifest(folder: &Path, dialect: MetadataDialect) -> anyhow::Result<Manifest> {
        let mut entries = fs::read_dir(folder)
            .with_context(|| format!("Failed to list '{}'", folder.display()))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list '{}'", folder.display()))?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut manifest = Manifest::default();
        for entry in entries {
            let path = entry.path();
            let meta = entry
                .metadata()
                .with_context(|| format!("Failed to stat '{}'", path.display()))?;
            if meta.is_dir() {
                manifest.folders.push(file_name(&path));
            } else if !is_opex_file(&path) {
                let kind = if dialect.is_metadata_file(&path) {
                    FileKind::Metadata
                } else {
                    FileKind::Content
                };
                manifest.files.push(ManifestFile {
                    kind,
                    size: Some(meta.len()),
                    path: file_name(&path),
                });
            }
        }
        Ok(manifest)
    }

    fn build(folder: &Path, dialect: MetadataDialect) -> (OpexBuildItem, anyhow::Result<()>) {
        let name = file_name(folder);
        let mut item = OpexBuildItem {
            opex_file: folder.join(format!("{name}.{OPEX_EXTENSION}")),
            files: 0,
            folders: 0,
            is_written: false,
            messages: Vec::new(),
        };
        let result = Self::manifest(folder, dialect).and_then(|manifest| {
            item.files = manifest.files.len();
            item.folders = manifest.folders.len();
            let xml = OpexMetadata::for_folder(name, manifest).to_xml()?;
            fs::write(&item.opex_file, xml)
                .with_context(|| format!("Failed to write '{}'", item.opex_file.display()))
        });
        item.is_written = result.is_ok();
        (item, result)
    }
}

#[async_trait]
impl StageBody for OpexBuildStage {
    type Item = OpexBuildItem;

    fn name(&self) -> &str {
        "BuildOpex"
    }

    fn started_description(&self, ctx: &CollectionContext) -> String {
        format!("Start building Opex for container '{}'.", ctx.collection)
    }

    fn completed_description(&self, _ctx: &CollectionContext) -> String {
        "Build Opex with a collection is done.".to_string()
    }

    fn failure_summary(&self, ctx: &CollectionContext) -> String {
        format!("Build Opex with collection: '{}' failed!", ctx.collection)
    }

    fn is_accepted(&self, item: &OpexBuildItem) -> bool {
        item.is_written
    }

    async fn execute(
        &self,
        ctx: &CollectionContext,
        progress: &mut StageProgress<'_, OpexBuildItem>,
    ) -> Result<(), PreingestError> {
        let root = ctx.working_folder()?;
        let mut folders = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                folders.push(entry.into_path());
            }
        }
        info!(session_id = %ctx.session_id, folders = folders.len(), "Building OPEX sidecars");

        for folder in folders {
            let (mut item, result) = Self::build(&folder, ctx.dialect);
            if let Err(err) = result {
                warn!(folder = %folder.display(), error = %err, "Failed to build OPEX sidecar");
                item.messages = failure_lines(
                    format!("Failed to build Opex for folder '{}'", folder.display()),
                    &err,
                );
            }
            progress
                .record(item, format!("Processing folder '{}'", folder.display()))
                .await;
        }
        Ok(())
    }
}

/// Result of removing one sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpexRevertItem {
    /// The sidecar.
    pub opex_file: PathBuf,
    /// True once the sidecar is gone.
    pub is_removed: bool,
    /// Diagnostics of a failed removal.
    pub messages: Vec<String>,
}

/// Removes every OPEX sidecar from the collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpexRevertStage;

impl OpexRevertStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Removes a sidecar once it reads as an OPEX document; anything else
    /// carrying the extension is left in place.
    fn remove(opex_file: &Path) -> anyhow::Result<()> {
        let xml = fs::read_to_string(opex_file)
            .with_context(|| format!("Failed to read '{}'", opex_file.display()))?;
        let opex = OpexMetadata::parse(&xml)
            .map_err(|err| PreingestError::xml(opex_file, err.to_string()))?;
        let files = opex
            .transfer
            .and_then(|t| t.manifest)
            .map_or(0, |m| m.files.len());
        fs::remove_file(opex_file)
            .with_context(|| format!("Failed to delete '{}'", opex_file.display()))?;
        debug!(file = %opex_file.display(), files, "Removed OPEX sidecar");
        Ok(())
    }
}

#[async_trait]
impl StageBody for OpexRevertStage {
    type Item = OpexRevertItem;

    fn name(&self) -> &str {
        "RevertCollection"
    }

    fn started_description(&self, ctx: &CollectionContext) -> String {
        format!("Start reverting Opex for container '{}'.", ctx.collection)
    }

    fn completed_description(&self, _ctx: &CollectionContext) -> String {
        "Revert Opex with a collection is done.".to_string()
    }

    fn failure_summary(&self, ctx: &CollectionContext) -> String {
        format!("Revert Opex with collection: '{}' failed!", ctx.collection)
    }

    fn is_accepted(&self, item: &OpexRevertItem) -> bool {
        item.is_removed
    }

    async fn execute(
        &self,
        ctx: &CollectionContext,
        progress: &mut StageProgress<'_, OpexRevertItem>,
    ) -> Result<(), PreingestError> {
        let root = ctx.working_folder()?;
        let mut sidecars = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_opex_file(entry.path()) {
                sidecars.push(entry.into_path());
            }
        }
        info!(session_id = %ctx.session_id, count = sidecars.len(), "Removing OPEX sidecars");

        for opex_file in sidecars {
            let mut item = OpexRevertItem {
                opex_file: opex_file.clone(),
                is_removed: false,
                messages: Vec::new(),
            };
            match Self::remove(&opex_file) {
                Ok(()) => item.is_removed = true,
                Err(err) => {
                    warn!(file = %opex_file.display(), error = %err, "Failed to remove OPEX sidecar");
                    item.messages = failure_lines(
                        format!("Failed to remove '{}'", opex_file.display()),
                        &err,
                    );
                }
            }
            progress
                .record(item, format!("Processing file '{}'", opex_file.display()))
                .await;
        }
        Ok(())
    }
}
