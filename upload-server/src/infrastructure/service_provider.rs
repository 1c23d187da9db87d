use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use domain_upload::service::{StagingSweepService, UploadService};
use service_upload::{
    CompletenessServiceImpl, FingerprintLocks, LocalChunkStoreServiceImpl, MergeServiceImpl,
    StagingSweepServiceImpl, StorageLayout, UploadServiceImpl,
};

use super::background::{BackgroundService, StagingSweeper};
use super::config::UploadServerConfig;

/// Every long lived service of the server, wired once at startup.
#[derive(Clone)]
pub struct ServiceProvider {
    pub config: UploadServerConfig,
    pub upload_service: Arc<dyn UploadService>,
    pub sweep_service: Arc<dyn StagingSweepService>,
}

impl ServiceProvider {
    pub async fn build(config: UploadServerConfig) -> anyhow::Result<Self> {
        let storage = config.storage();
        let layout = StorageLayout::new(storage.root());
        layout.prepare().await?;
        let locks = Arc::new(FingerprintLocks::new());
        let staging_ttl =
            chrono::Duration::from_std(Duration::from_secs(*storage.staging_ttl_secs()))
                .context("storage.staging_ttl_secs is out of range")?;

        let chunk_store = Arc::new(LocalChunkStoreServiceImpl::builder().layout(layout.clone()).build());
        let completeness_service = Arc::new(
            CompletenessServiceImpl::builder()
                .layout(layout.clone())
                .chunk_store(chunk_store.clone())
                .build(),
        );
        let merge_service = Arc::new(
            MergeServiceImpl::builder()
                .layout(layout.clone())
                .chunk_store(chunk_store.clone())
                .completeness_service(completeness_service.clone())
                .locks(locks.clone())
                .timeout(Duration::from_secs(*storage.merge_timeout_secs()))
                .build(),
        );
        let upload_service = Arc::new(
            UploadServiceImpl::builder()
                .chunk_store(chunk_store)
                .completeness_service(completeness_service)
                .merge_service(merge_service)
                .locks(locks.clone())
                .build(),
        );
        let sweep_service = Arc::new(
            StagingSweepServiceImpl::builder()
                .layout(layout)
                .locks(locks)
                .ttl(staging_ttl)
                .build(),
        );

        Ok(Self {
            config,
            upload_service,
            sweep_service,
        })
    }

    pub fn background_services(&self) -> Vec<Arc<dyn BackgroundService>> {
        vec![Arc::new(StagingSweeper::new(
            self.sweep_service.clone(),
            Duration::from_secs(*self.config.storage().sweep_interval_secs()),
        ))]
    }
}
