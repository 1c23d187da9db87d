use std::io::ErrorKind;
use std::sync::Arc;

use async_trait::async_trait;
use domain_upload::{
    exception::UploadResult,
    model::{entity::UploadStatus, vo::FileFingerprint},
    service::{ChunkStoreService, CompletenessService},
};
use typed_builder::TypedBuilder;

use crate::layout::StorageLayout;

#[derive(TypedBuilder)]
pub struct CompletenessServiceImpl {
    layout: StorageLayout,
    chunk_store: Arc<dyn ChunkStoreService>,
}

#[async_trait]
impl CompletenessService for CompletenessServiceImpl {
    async fn is_complete(
        &self,
        fingerprint: &FileFingerprint,
        file_name: &str,
    ) -> UploadResult<bool> {
        let path = self.layout.artifact_path(fingerprint, file_name)?;
        match tokio::fs::metadata(&path).await {
            // Only a regular file is a published artifact.
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("check artifact {path:?}"))
                .into()),
        }
    }

    async fn status(
        &self,
        fingerprint: &FileFingerprint,
        file_name: &str,
    ) -> UploadResult<UploadStatus> {
        if self.is_complete(fingerprint, file_name).await? {
            return Ok(UploadStatus::Complete);
        }
        let existing = self
            .chunk_store
            .staged_chunks(fingerprint)
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(|chunk| chunk.identifier)
            .collect();
        Ok(UploadStatus::Incomplete { existing })
    }
}
