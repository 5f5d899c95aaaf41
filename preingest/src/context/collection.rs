//! Identity of the collection under test.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::MetadataDialect;
use crate::config::PreingestSettings;
use crate::errors::PreingestError;

/// Identifies one collection run: the session, its data folder and the
/// metadata dialect the collection is described in.
///
/// Supplied once per pipeline run and read-only to every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionContext {
    /// The session (one uploaded collection).
    pub session_id: Uuid,
    /// Root folder holding all sessions.
    pub data_folder: PathBuf,
    /// Logical name of the collection, e.g. the uploaded archive name.
    pub collection: String,
    /// Metadata dialect of the collection.
    pub dialect: MetadataDialect,
}

impl CollectionContext {
    /// Creates a context for a session in a data folder.
    #[must_use]
    pub fn new(
        session_id: Uuid,
        data_folder: impl Into<PathBuf>,
        collection: impl Into<String>,
        dialect: MetadataDialect,
    ) -> Self {
        Self {
            session_id,
            data_folder: data_folder.into(),
            collection: collection.into(),
            dialect,
        }
    }

    /// Creates a context from settings, detecting the dialect from the
    /// working folder contents.
    pub fn detect(
        settings: &PreingestSettings,
        session_id: Uuid,
        collection: impl Into<String>,
    ) -> Result<Self, PreingestError> {
        let mut ctx = Self::new(
            session_id,
            settings.data_folder_name.clone(),
            collection,
            MetadataDialect::ToPX,
        );
        ctx.dialect = MetadataDialect::detect(&ctx.working_folder()?)?;
        Ok(ctx)
    }

    /// The session folder, `<data_folder>/<session_id>`, without checking it exists.
    #[must_use]
    pub fn session_folder(&self) -> PathBuf {
        self.data_folder.join(self.session_id.to_string())
    }

    /// The session folder, failing when it is absent.
    pub fn working_folder(&self) -> Result<PathBuf, PreingestError> {
        let folder = self.session_folder();
        if folder.is_dir() {
            Ok(folder)
        } else {
            Err(PreingestError::MissingWorkingFolder(folder))
        }
    }

    /// Path of `file` relative to the data folder, with `/` separators.
    ///
    /// Returns `None` when the file is not below the data folder.
    #[must_use]
    pub fn relative_to_data_folder(&self, file: &Path) -> Option<Vec<String>> {
        let rel = file.strip_prefix(&self.data_folder).ok()?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_folder_is_derived() {
        let id = Uuid::new_v4();
        let ctx = CollectionContext::new(id, "/data", "archive.tar", MetadataDialect::ToPX);
        assert_eq!(ctx.session_folder(), PathBuf::from("/data").join(id.to_string()));
    }

    #[test]
    fn test_working_folder_missing() {
        let ctx = CollectionContext::new(
            Uuid::new_v4(),
            "/definitely/not/here",
            "c",
            MetadataDialect::Mdto,
        );
        assert!(matches!(
            ctx.working_folder(),
            Err(PreingestError::MissingWorkingFolder(_))
        ));
    }

    #[test]
    fn test_relative_path_segments() {
        let ctx = CollectionContext::new(Uuid::nil(), "/data", "c", MetadataDialect::ToPX);
        let segments = ctx
            .relative_to_data_folder(Path::new("/data/abc/Map 1/file.metadata"))
            .unwrap();
        assert_eq!(segments, vec!["abc", "Map 1", "file.metadata"]);
        assert!(ctx.relative_to_data_folder(Path::new("/other/file")).is_none());
    }

    #[test]
    fn test_detect_uses_folder_contents() {
        let data = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let session = data.path().join(id.to_string());
        std::fs::create_dir_all(session.join("sub")).unwrap();
        std::fs::write(session.join("sub").join("rec.mdto.xml"), "<MDTO/>").unwrap();

        let settings = PreingestSettings::default().with_data_folder(data.path());
        let ctx = CollectionContext::detect(&settings, id, "upload.zip").unwrap();
        assert_eq!(ctx.dialect, MetadataDialect::Mdto);
    }
}
