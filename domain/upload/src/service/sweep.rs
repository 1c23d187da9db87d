use async_trait::async_trait;

use crate::exception::UploadResult;
use crate::model::entity::SweepReport;

#[async_trait]
pub trait StagingSweepService: Send + Sync {
    /// Remove staging areas and merge leftovers nobody touched for too long.
    async fn sweep(&self) -> UploadResult<SweepReport>;
}
