use std::io::{ErrorKind, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use domain_upload::{
    command::MergeCommand,
    exception::{UploadException, UploadResult},
    model::{
        entity::{MergeOutcome, StagedChunk},
        vo::FileFingerprint,
    },
    service::{ChunkStoreService, CompletenessService, MergeService},
};
use futures::future::{join_all, try_join_all};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::layout::StorageLayout;
use crate::lock::FingerprintLocks;

/// Upper bound of missing indices reported back to the client.
const MAX_REPORTED_MISSING: usize = 32;

/// # Merge service
///
/// Chunks are copied concurrently into a hidden file at their offsets. The file is
/// renamed onto the artifact path only after every copy succeeded, and staged chunks
/// are deleted only after that, so a failed merge can simply be retried.
#[derive(TypedBuilder)]
pub struct MergeServiceImpl {
    layout: StorageLayout,
    chunk_store: Arc<dyn ChunkStoreService>,
    completeness_service: Arc<dyn CompletenessService>,
    locks: Arc<FingerprintLocks>,
    #[builder(default = Duration::from_secs(10 * 60))]
    timeout: Duration,
}

/// A chunk with the artifact offset its bytes go to.
#[derive(Debug)]
struct PlannedChunk {
    chunk: StagedChunk,
    offset: u64,
}

#[derive(Debug)]
struct MergePlan {
    chunks: Vec<PlannedChunk>,
    total_len: u64,
}

impl MergePlan {
    /// Orders chunks by index and assigns offsets.
    ///
    /// Indices must run from 0 without gaps. Every chunk but the last must be exactly
    /// `declared_chunk_size` long and the last one no longer than that.
    fn new(
        fingerprint: &FileFingerprint,
        mut chunks: Vec<StagedChunk>,
        declared_chunk_size: u64,
    ) -> UploadResult<Self> {
        chunks.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let mut missing = vec![];
        let mut expected = 0u64;
        for chunk in &chunks {
            let index = chunk.identifier.index();
            if index > expected {
                let room = MAX_REPORTED_MISSING.saturating_sub(missing.len());
                missing.extend((expected..index).take(room));
            }
            expected = index.saturating_add(1);
        }
        if chunks.is_empty() {
            missing.push(0);
        }
        if !missing.is_empty() {
            return Err(UploadException::MissingChunks {
                fingerprint: fingerprint.to_string(),
                missing,
            });
        }

        let last = chunks.len() - 1;
        let mut planned = Vec::with_capacity(chunks.len());
        let mut offset = 0u64;
        for (position, chunk) in chunks.into_iter().enumerate() {
            let fits = if position == last {
                chunk.len <= declared_chunk_size
            } else {
                chunk.len == declared_chunk_size
            };
            if !fits {
                return Err(UploadException::ChunkSizeMismatch {
                    identifier: chunk.identifier.to_string(),
                    declared: declared_chunk_size,
                    actual: chunk.len,
                });
            }
            let len = chunk.len;
            planned.push(PlannedChunk { chunk, offset });
            offset += len;
        }
        Ok(Self {
            chunks: planned,
            total_len: offset,
        })
    }
}

/// Copy one chunk into `target` at its offset.
async fn transfer(part: &PlannedChunk, target: &Path) -> UploadResult<()> {
    let source = &part.chunk.path;
    let mut reader = tokio::fs::File::open(source)
        .await
        .with_context(|| format!("open chunk {source:?}"))?
        .take(part.chunk.len);
    let mut writer = tokio::fs::OpenOptions::new()
        .write(true)
        .open(target)
        .await
        .with_context(|| format!("open {target:?} for chunk {}", part.chunk.identifier))?;
    writer
        .seek(SeekFrom::Start(part.offset))
        .await
        .with_context(|| format!("seek {target:?} to {}", part.offset))?;
    let copied = tokio::io::copy(&mut reader, &mut writer)
        .await
        .with_context(|| format!("copy chunk {source:?} into {target:?}"))?;
    writer.flush().await.with_context(|| format!("flush {target:?}"))?;
    if copied != part.chunk.len {
        return Err(anyhow!(
            "chunk {} shrank while merging: {copied} of {} bytes copied",
            part.chunk.identifier,
            part.chunk.len
        )
        .into());
    }
    debug!(
        "Copied chunk {} to offset {} of {target:?}.",
        part.chunk.identifier, part.offset
    );
    Ok(())
}

/// Create `target` at its final length. Done before the merge timeout starts, so a
/// timed out merge never leaves a file created after it was discarded.
async fn allocate(plan: &MergePlan, target: &Path) -> UploadResult<tokio::fs::File> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .await
        .with_context(|| format!("create {target:?}"))?;
    file.set_len(plan.total_len)
        .await
        .with_context(|| format!("resize {target:?} to {}", plan.total_len))?;
    Ok(file)
}

/// Write every planned chunk into the allocated `target`.
async fn assemble(plan: &MergePlan, file: &tokio::fs::File, target: &Path) -> UploadResult<()> {
    // Offsets are fixed by the plan, so the copies don't depend on each other.
    try_join_all(plan.chunks.iter().map(|part| transfer(part, target))).await?;
    file.sync_all().await.with_context(|| format!("sync {target:?}"))?;
    Ok(())
}

async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Can't remove unfinished merge {path:?}: {e}"),
    }
}

#[async_trait]
impl MergeService for MergeServiceImpl {
    async fn merge(&self, cmd: MergeCommand) -> UploadResult<MergeOutcome> {
        let MergeCommand {
            fingerprint,
            file_name,
            declared_chunk_size,
        } = cmd;
        if declared_chunk_size == 0 {
            return Err(UploadException::invalid_request(
                "Declared chunk size must be positive.",
            ));
        }
        let artifact = self.layout.artifact_path(&fingerprint, &file_name)?;

        let _guard = self.locks.acquire(&fingerprint).await;
        if self.completeness_service.is_complete(&fingerprint, &file_name).await? {
            info!("Artifact {artifact:?} already exists, skip merging.");
            return Ok(MergeOutcome::AlreadyComplete);
        }
        let chunks = self.chunk_store.staged_chunks(&fingerprint).await?.ok_or_else(|| {
            UploadException::UploadExpired {
                fingerprint: fingerprint.to_string(),
            }
        })?;
        let plan = MergePlan::new(&fingerprint, chunks, declared_chunk_size)?;

        let merging = self.layout.merging_path(&fingerprint, &file_name)?;
        let file = match allocate(&plan, &merging).await {
            Ok(file) => file,
            Err(e) => {
                discard(&merging).await;
                return Err(e);
            }
        };
        let assembled = tokio::time::timeout(self.timeout, assemble(&plan, &file, &merging)).await;
        drop(file);
        match assembled {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                discard(&merging).await;
                return Err(e);
            }
            Err(_) => {
                discard(&merging).await;
                return Err(UploadException::MergeTimedOut {
                    fingerprint: fingerprint.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        }
        if let Err(e) = tokio::fs::rename(&merging, &artifact).await {
            discard(&merging).await;
            return Err(anyhow::Error::from(e)
                .context(format!("publish {merging:?} as {artifact:?}"))
                .into());
        }
        info!(
            "Merged {} chunks of {fingerprint} into {artifact:?} ({} bytes).",
            plan.chunks.len(),
            plan.total_len
        );

        // The artifact is authoritative from here on, leftovers are swept later.
        let removals = plan.chunks.iter().map(|part| self.chunk_store.remove_chunk(&part.chunk));
        for result in join_all(removals).await {
            if let Err(e) = result {
                warn!("Can't remove merged chunk of {fingerprint}: {e}");
            }
        }
        if let Err(e) = self.chunk_store.remove_staging_area(&fingerprint).await {
            warn!("Can't remove staging area of {fingerprint}: {e}");
        }
        Ok(MergeOutcome::Merged {
            size: plan.total_len,
        })
    }
}
