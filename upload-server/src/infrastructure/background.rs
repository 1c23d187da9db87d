use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain_upload::service::StagingSweepService;
use tracing::{error, info};

/// A task running for the whole lifetime of the server.
#[async_trait]
pub trait BackgroundService: Send + Sync {
    async fn run(&self);
}

/// Periodically removes abandoned uploads.
pub struct StagingSweeper {
    sweep_service: Arc<dyn StagingSweepService>,
    interval: Duration,
}

impl StagingSweeper {
    pub fn new(sweep_service: Arc<dyn StagingSweepService>, interval: Duration) -> Self {
        Self {
            sweep_service,
            // tokio intervals can't be zero.
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    async fn sweep_once(&self) {
        match self.sweep_service.sweep().await {
            Ok(report) if report.is_empty() => {}
            Ok(report) => info!(
                "Swept {} expired staging areas and {} abandoned merges.",
                report.expired_staging_areas, report.abandoned_merges
            ),
            Err(e) => error!("Sweeping staging areas failed: {e}"),
        }
    }
}

#[async_trait]
impl BackgroundService for StagingSweeper {
    async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            self.sweep_once().await;
        }
    }
}
