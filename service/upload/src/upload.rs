use std::sync::Arc;

use async_trait::async_trait;
use domain_upload::{
    command::{MergeCommand, StageChunkCommand},
    exception::UploadResult,
    model::{
        entity::{MergeOutcome, StageOutcome, UploadStatus},
        vo::FileFingerprint,
    },
    service::{ChunkStoreService, CompletenessService, MergeService, UploadService},
};
use tracing::info;
use typed_builder::TypedBuilder;

use crate::lock::FingerprintLocks;

#[derive(TypedBuilder)]
pub struct UploadServiceImpl {
    chunk_store: Arc<dyn ChunkStoreService>,
    completeness_service: Arc<dyn CompletenessService>,
    merge_service: Arc<dyn MergeService>,
    locks: Arc<FingerprintLocks>,
}

#[async_trait]
impl UploadService for UploadServiceImpl {
    async fn stage(&self, cmd: StageChunkCommand) -> UploadResult<StageOutcome> {
        let StageChunkCommand {
            fingerprint,
            identifier,
            source,
            file_name,
        } = cmd;
        // Merge, cancel and the sweeper can't remove the staging area underneath.
        let _guard = self.locks.share(&fingerprint).await;
        if let Some(file_name) = file_name {
            if self.completeness_service.is_complete(&fingerprint, &file_name).await? {
                info!("Upload {fingerprint} is already complete, skip chunk {identifier}.");
                return Ok(StageOutcome::AlreadyComplete);
            }
        }
        self.chunk_store.stage(&fingerprint, &identifier, source).await?;
        Ok(StageOutcome::Staged)
    }

    async fn status(
        &self,
        fingerprint: &FileFingerprint,
        file_name: &str,
    ) -> UploadResult<UploadStatus> {
        self.completeness_service.status(fingerprint, file_name).await
    }

    async fn merge(&self, cmd: MergeCommand) -> UploadResult<MergeOutcome> {
        self.merge_service.merge(cmd).await
    }

    async fn cancel(&self, fingerprint: &FileFingerprint) -> UploadResult<bool> {
        let _guard = self.locks.acquire(fingerprint).await;
        let removed = self.chunk_store.remove_staging_area(fingerprint).await?;
        if removed {
            info!("Cancelled upload {fingerprint}.");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use domain_upload::command::ChunkSource;
    use domain_upload::exception::UploadException;
    use domain_upload::mock::{MockChunkStoreService, MockCompletenessService, MockMergeService};
    use domain_upload::model::vo::ChunkIdentifier;

    use super::*;

    fn load(
        chunk_store: MockChunkStoreService,
        completeness_service: MockCompletenessService,
        merge_service: MockMergeService,
    ) -> UploadServiceImpl {
        load_with_locks(
            chunk_store,
            completeness_service,
            merge_service,
            Arc::new(FingerprintLocks::new()),
        )
    }

    fn load_with_locks(
        chunk_store: MockChunkStoreService,
        completeness_service: MockCompletenessService,
        merge_service: MockMergeService,
        locks: Arc<FingerprintLocks>,
    ) -> UploadServiceImpl {
        UploadServiceImpl::builder()
            .chunk_store(Arc::new(chunk_store))
            .completeness_service(Arc::new(completeness_service))
            .merge_service(Arc::new(merge_service))
            .locks(locks)
            .build()
    }

    fn stage_cmd(file_name: Option<&str>) -> StageChunkCommand {
        let fingerprint = FileFingerprint::new("abc123").unwrap();
        StageChunkCommand {
            identifier: ChunkIdentifier::new(&fingerprint, 0),
            fingerprint,
            source: ChunkSource::Bytes(b"abc".to_vec()),
            file_name: file_name.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn stage_without_file_name_always_stores() {
        let mut chunk_store = MockChunkStoreService::new();
        chunk_store
            .expect_stage()
            .withf(|fingerprint, identifier, _| {
                fingerprint.as_str() == "abc123" && identifier.as_str() == "abc123-0"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut completeness_service = MockCompletenessService::new();
        completeness_service.expect_is_complete().never();
        let service = load(chunk_store, completeness_service, MockMergeService::new());

        assert_eq!(service.stage(stage_cmd(None)).await.unwrap(), StageOutcome::Staged);
    }

    #[tokio::test]
    async fn stage_skips_completed_upload() {
        let mut chunk_store = MockChunkStoreService::new();
        chunk_store.expect_stage().never();
        let mut completeness_service = MockCompletenessService::new();
        completeness_service
            .expect_is_complete()
            .withf(|_, file_name| file_name.to_string() == "video.mp4")
            .times(1)
            .returning(|_, _| Ok(true));
        let service = load(chunk_store, completeness_service, MockMergeService::new());

        let outcome = service.stage(stage_cmd(Some("video.mp4"))).await.unwrap();
        assert_eq!(outcome, StageOutcome::AlreadyComplete);
    }

    #[tokio::test]
    async fn stage_propagates_storage_fault() {
        let mut chunk_store = MockChunkStoreService::new();
        chunk_store
            .expect_stage()
            .returning(|_, _, _| Err(anyhow::anyhow!("disk full").into()));
        let mut completeness_service = MockCompletenessService::new();
        completeness_service.expect_is_complete().returning(|_, _| Ok(false));
        let service = load(chunk_store, completeness_service, MockMergeService::new());

        let err = service.stage(stage_cmd(Some("video.mp4"))).await.unwrap_err();
        assert!(matches!(err, UploadException::StorageFault { .. }));
    }

    #[tokio::test]
    async fn merge_delegates() {
        let mut merge_service = MockMergeService::new();
        merge_service
            .expect_merge()
            .withf(|cmd| cmd.declared_chunk_size == 1024 && cmd.file_name == "video.mp4")
            .times(1)
            .returning(|_| Ok(MergeOutcome::Merged { size: 2048 }));
        let service = load(
            MockChunkStoreService::new(),
            MockCompletenessService::new(),
            merge_service,
        );

        let outcome = service
            .merge(MergeCommand {
                fingerprint: FileFingerprint::new("abc123").unwrap(),
                file_name: "video.mp4".to_string(),
                declared_chunk_size: 1024,
            })
            .await
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { size: 2048 });
    }

    #[tokio::test]
    async fn cancel_removes_staging_area() {
        let mut chunk_store = MockChunkStoreService::new();
        chunk_store.expect_remove_staging_area().times(1).returning(|_| Ok(true));
        let service = load(
            chunk_store,
            MockCompletenessService::new(),
            MockMergeService::new(),
        );

        assert!(service.cancel(&FileFingerprint::new("abc123").unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn stage_waits_while_staging_area_is_being_removed() {
        let mut chunk_store = MockChunkStoreService::new();
        chunk_store.expect_stage().times(1).returning(|_, _, _| Ok(()));
        let locks = Arc::new(FingerprintLocks::new());
        let service = Arc::new(load_with_locks(
            chunk_store,
            MockCompletenessService::new(),
            MockMergeService::new(),
            locks.clone(),
        ));
        let fingerprint = FileFingerprint::new("abc123").unwrap();

        let guard = locks.acquire(&fingerprint).await;
        let stage = {
            let service = service.clone();
            tokio::spawn(async move { service.stage(stage_cmd(None)).await })
        };
        tokio::task::yield_now().await;
        assert!(!stage.is_finished());

        drop(guard);
        assert_eq!(stage.await.unwrap().unwrap(), StageOutcome::Staged);
        assert!(locks.is_empty());
    }
}
