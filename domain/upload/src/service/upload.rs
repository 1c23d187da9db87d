use async_trait::async_trait;

use crate::command::{MergeCommand, StageChunkCommand};
use crate::exception::UploadResult;
use crate::model::entity::{MergeOutcome, StageOutcome, UploadStatus};
use crate::model::vo::FileFingerprint;

/// # Upload service
///
/// Entry point of resumable uploads: stage chunks, ask what is missing, merge.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn stage(&self, cmd: StageChunkCommand) -> UploadResult<StageOutcome>;

    async fn status(&self, fingerprint: &FileFingerprint, file_name: &str)
        -> UploadResult<UploadStatus>;

    async fn merge(&self, cmd: MergeCommand) -> UploadResult<MergeOutcome>;

    /// Drop every staged chunk of an upload, returns whether there were any.
    async fn cancel(&self, fingerprint: &FileFingerprint) -> UploadResult<bool>;
}
