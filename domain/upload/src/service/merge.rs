use async_trait::async_trait;

use crate::command::MergeCommand;
use crate::exception::UploadResult;
use crate::model::entity::MergeOutcome;

/// # Merge service
///
/// Assembles the staged chunks of an upload into its artifact.
#[async_trait]
pub trait MergeService: Send + Sync {
    /// Merge the staged chunks, ordered by index.
    ///
    /// Returns [`MergeOutcome::AlreadyComplete`] without touching storage when the
    /// artifact exists. Fails with `UploadExpired` when there is nothing staged.
    async fn merge(&self, cmd: MergeCommand) -> UploadResult<MergeOutcome>;
}
