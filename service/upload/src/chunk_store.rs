use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use domain_upload::{
    command::ChunkSource,
    exception::UploadResult,
    model::{
        entity::StagedChunk,
        vo::{ChunkIdentifier, FileFingerprint},
    },
    service::ChunkStoreService,
};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::layout::{is_hidden, StorageLayout};

/// Keeps staging areas as directories under the storage root.
#[derive(TypedBuilder, Clone)]
pub struct LocalChunkStoreServiceImpl {
    layout: StorageLayout,
}

impl LocalChunkStoreServiceImpl {
    /// Move `source` onto `target`. Falls back to copying through a hidden file next to
    /// `target` when a rename isn't possible, e.g. across filesystems.
    async fn move_into_place(&self, source: &Path, target: &Path, incoming: &Path) -> UploadResult<()> {
        let Err(e) = tokio::fs::rename(source, target).await else {
            return Ok(());
        };
        debug!("Rename {source:?} -> {target:?} failed: {e}, copying instead.");
        tokio::fs::copy(source, incoming)
            .await
            .with_context(|| format!("copy chunk {source:?} to {incoming:?}"))?;
        if let Err(e) = tokio::fs::rename(incoming, target).await {
            let _ = tokio::fs::remove_file(incoming).await;
            return Err(anyhow::Error::from(e)
                .context(format!("rename {incoming:?} to {target:?}"))
                .into());
        }
        if let Err(e) = tokio::fs::remove_file(source).await {
            warn!("Chunk source {source:?} was copied but can't be removed: {e}");
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkStoreService for LocalChunkStoreServiceImpl {
    async fn stage(
        &self,
        fingerprint: &FileFingerprint,
        identifier: &ChunkIdentifier,
        source: ChunkSource,
    ) -> UploadResult<()> {
        let dir = self.layout.staging_dir(fingerprint);
        // Succeeds when a concurrent request created the directory first.
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create staging area {dir:?}"))?;

        let target = self.layout.chunk_path(fingerprint, identifier);
        let incoming = self.layout.incoming_chunk_path(fingerprint, identifier);
        match source {
            ChunkSource::TempFile(path) => self.move_into_place(&path, &target, &incoming).await?,
            ChunkSource::Bytes(content) => {
                tokio::fs::write(&incoming, &content)
                    .await
                    .with_context(|| format!("write chunk {incoming:?}"))?;
                if let Err(e) = tokio::fs::rename(&incoming, &target).await {
                    let _ = tokio::fs::remove_file(&incoming).await;
                    return Err(anyhow::Error::from(e)
                        .context(format!("rename {incoming:?} to {target:?}"))
                        .into());
                }
            }
        }
        debug!("Staged chunk {identifier} at {target:?}.");
        Ok(())
    }

    async fn staged_chunks(
        &self,
        fingerprint: &FileFingerprint,
    ) -> UploadResult<Option<Vec<StagedChunk>>> {
        let dir = self.layout.staging_dir(fingerprint);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::from(e)
                    .context(format!("read staging area {dir:?}"))
                    .into())
            }
        };

        let mut chunks = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("read staging area {dir:?}"))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Skip non utf8 entry {:?} in {dir:?}.", entry.path());
                continue;
            };
            if is_hidden(name) {
                continue;
            }
            let identifier = match ChunkIdentifier::parse(fingerprint, name) {
                Ok(identifier) => identifier,
                Err(e) => {
                    warn!("Skip foreign entry {name} in {dir:?}: {e}");
                    continue;
                }
            };
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Removed by a concurrent cleanup after it was listed.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(anyhow::Error::from(e)
                        .context(format!("stat chunk {:?}", entry.path()))
                        .into())
                }
            };
            if !metadata.is_file() {
                warn!("Skip non file entry {name} in {dir:?}.");
                continue;
            }
            chunks.push(StagedChunk {
                identifier,
                len: metadata.len(),
                path: entry.path(),
            });
        }
        chunks.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(Some(chunks))
    }

    async fn remove_chunk(&self, chunk: &StagedChunk) -> UploadResult<()> {
        match tokio::fs::remove_file(&chunk.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("remove chunk {:?}", chunk.path))
                .into()),
        }
    }

    async fn remove_staging_area(&self, fingerprint: &FileFingerprint) -> UploadResult<bool> {
        let dir = self.layout.staging_dir(fingerprint);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("remove staging area {dir:?}"))
                .into()),
        }
    }
}
