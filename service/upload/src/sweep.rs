use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domain_upload::{
    exception::UploadResult,
    model::{entity::SweepReport, vo::FileFingerprint},
    service::StagingSweepService,
};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::layout::{is_hidden, StorageLayout, MERGING_SUFFIX};
use crate::lock::FingerprintLocks;

/// Removes uploads that were abandoned before merging.
///
/// A staging area counts as abandoned when no chunk arrived for `ttl`. A staging
/// area whose upload is staging, merging or being cancelled right now is left alone.
#[derive(TypedBuilder)]
pub struct StagingSweepServiceImpl {
    layout: StorageLayout,
    locks: Arc<FingerprintLocks>,
    #[builder(default = Duration::hours(24))]
    ttl: Duration,
}

/// Directory entry untouched for longer than the TTL.
struct IdleEntry {
    path: PathBuf,
    name: String,
    is_dir: bool,
    modified: DateTime<Utc>,
}

impl StagingSweepServiceImpl {
    async fn idle_entries(&self, dir: &Path) -> UploadResult<Vec<IdleEntry>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(anyhow::Error::from(e)
                    .context(format!("read directory {dir:?}"))
                    .into())
            }
        };
        let now = Utc::now();

        let mut idle = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("read directory {dir:?}"))?
        {
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Can't stat {path:?}: {e}");
                    continue;
                }
            };
            let modified: DateTime<Utc> = match metadata.modified() {
                Ok(modified) => modified.into(),
                Err(e) => {
                    warn!("Can't read modification time of {path:?}: {e}");
                    continue;
                }
            };
            if now - modified < self.ttl {
                continue;
            }
            idle.push(IdleEntry {
                path,
                name,
                is_dir: metadata.is_dir(),
                modified,
            });
        }
        Ok(idle)
    }
}

#[async_trait]
impl StagingSweepService for StagingSweepServiceImpl {
    async fn sweep(&self) -> UploadResult<SweepReport> {
        let mut report = SweepReport::default();

        for entry in self.idle_entries(&self.layout.staging_root()).await? {
            if !entry.is_dir {
                continue;
            }
            let Ok(fingerprint) = FileFingerprint::new(entry.name) else {
                continue;
            };
            let Some(_guard) = self.locks.try_acquire(&fingerprint) else {
                debug!("Upload {fingerprint} is busy, skip sweeping it.");
                continue;
            };
            match tokio::fs::remove_dir_all(&entry.path).await {
                Ok(()) => {
                    info!(
                        "Removed staging area of {fingerprint}, idle since {}.",
                        entry.modified
                    );
                    report.expired_staging_areas += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Can't remove staging area {:?}: {e}", entry.path),
            }
        }

        for entry in self.idle_entries(self.layout.root()).await? {
            if entry.is_dir || !is_hidden(&entry.name) || !entry.name.ends_with(MERGING_SUFFIX) {
                continue;
            }
            match tokio::fs::remove_file(&entry.path).await {
                Ok(()) => {
                    info!("Removed abandoned merge {:?}.", entry.path);
                    report.abandoned_merges += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Can't remove abandoned merge {:?}: {e}", entry.path),
            }
        }
        Ok(report)
    }
}
