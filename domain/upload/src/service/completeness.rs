use async_trait::async_trait;

use crate::exception::UploadResult;
use crate::model::entity::UploadStatus;
use crate::model::vo::FileFingerprint;

/// Read only view over what an upload still needs.
#[async_trait]
pub trait CompletenessService: Send + Sync {
    /// Whether the artifact for `fingerprint` and the extension of `file_name` exists.
    async fn is_complete(&self, fingerprint: &FileFingerprint, file_name: &str)
        -> UploadResult<bool>;

    async fn status(&self, fingerprint: &FileFingerprint, file_name: &str)
        -> UploadResult<UploadStatus>;
}
