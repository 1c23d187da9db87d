use crate::{
    command::{ChunkSource, MergeCommand, StageChunkCommand},
    exception::UploadResult,
    model::{
        entity::{MergeOutcome, StageOutcome, StagedChunk, SweepReport, UploadStatus},
        vo::{ChunkIdentifier, FileFingerprint},
    },
    service::{
        ChunkStoreService, CompletenessService, MergeService, StagingSweepService, UploadService,
    },
};
use async_trait::async_trait;
use mockall::mock;

mock! {
    pub ChunkStoreService {}
    #[async_trait]
    impl ChunkStoreService for ChunkStoreService {
        async fn stage(
            &self,
            fingerprint: &FileFingerprint,
            identifier: &ChunkIdentifier,
            source: ChunkSource,
        ) -> UploadResult<()>;
        async fn staged_chunks(
            &self,
            fingerprint: &FileFingerprint,
        ) -> UploadResult<Option<Vec<StagedChunk>>>;
        async fn remove_chunk(&self, chunk: &StagedChunk) -> UploadResult<()>;
        async fn remove_staging_area(&self, fingerprint: &FileFingerprint) -> UploadResult<bool>;
    }
}

mock! {
    pub CompletenessService {}
    #[async_trait]
    impl CompletenessService for CompletenessService {
        async fn is_complete(&self, fingerprint: &FileFingerprint, file_name: &str)
            -> UploadResult<bool>;
        async fn status(&self, fingerprint: &FileFingerprint, file_name: &str)
            -> UploadResult<UploadStatus>;
    }
}

mock! {
    pub MergeService {}
    #[async_trait]
    impl MergeService for MergeService {
        async fn merge(&self, cmd: MergeCommand) -> UploadResult<MergeOutcome>;
    }
}

mock! {
    pub StagingSweepService {}
    #[async_trait]
    impl StagingSweepService for StagingSweepService {
        async fn sweep(&self) -> UploadResult<SweepReport>;
    }
}

mock! {
    pub UploadService {}
    #[async_trait]
    impl UploadService for UploadService {
        async fn stage(&self, cmd: StageChunkCommand) -> UploadResult<StageOutcome>;
        async fn status(&self, fingerprint: &FileFingerprint, file_name: &str)
            -> UploadResult<UploadStatus>;
        async fn merge(&self, cmd: MergeCommand) -> UploadResult<MergeOutcome>;
        async fn cancel(&self, fingerprint: &FileFingerprint) -> UploadResult<bool>;
    }
}
