use std::path::{Path, PathBuf};

use anyhow::Context;
use domain_upload::exception::UploadResult;
use domain_upload::model::vo::{ChunkIdentifier, FileFingerprint};
use uuid::Uuid;

pub(crate) const MERGING_SUFFIX: &str = ".merging";
const INCOMING_SUFFIX: &str = ".incoming";
const STAGING_DIR: &str = ".staging";

/// Paths of everything kept under the storage root.
///
/// ```text
/// <root>/.staging/<fingerprint>/<fingerprint>-<index>    staged chunk
/// <root>/<fingerprint><ext>                              artifact
/// <root>/.<fingerprint><ext>.<uuid>.merging              artifact being assembled
/// ```
///
/// Staging areas live in a hidden directory so no artifact name, with or without
/// an extension, can resolve to one.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the storage root and its staging directory if they are missing.
    pub async fn prepare(&self) -> UploadResult<()> {
        let staging_root = self.staging_root();
        tokio::fs::create_dir_all(&staging_root)
            .await
            .with_context(|| format!("create storage root: {staging_root:?}"))?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent of every staging area.
    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn staging_dir(&self, fingerprint: &FileFingerprint) -> PathBuf {
        self.staging_root().join(fingerprint.as_str())
    }

    pub fn chunk_path(&self, fingerprint: &FileFingerprint, identifier: &ChunkIdentifier) -> PathBuf {
        self.staging_dir(fingerprint).join(identifier.as_str())
    }

    /// Hidden file inside the staging area a chunk is written to before it is renamed
    /// into place.
    pub(crate) fn incoming_chunk_path(
        &self,
        fingerprint: &FileFingerprint,
        identifier: &ChunkIdentifier,
    ) -> PathBuf {
        self.staging_dir(fingerprint)
            .join(format!(".{identifier}.{}{INCOMING_SUFFIX}", Uuid::new_v4()))
    }

    pub fn artifact_path(&self, fingerprint: &FileFingerprint, file_name: &str) -> UploadResult<PathBuf> {
        Ok(self.root.join(fingerprint.artifact_file_name(file_name)?))
    }

    pub(crate) fn merging_path(
        &self,
        fingerprint: &FileFingerprint,
        file_name: &str,
    ) -> UploadResult<PathBuf> {
        let artifact = fingerprint.artifact_file_name(file_name)?;
        Ok(self.root.join(format!(".{artifact}.{}{MERGING_SUFFIX}", Uuid::new_v4())))
    }
}

/// Engine temporaries are dot files, they are never chunks nor artifacts.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
