use async_trait::async_trait;

use crate::command::ChunkSource;
use crate::exception::UploadResult;
use crate::model::entity::StagedChunk;
use crate::model::vo::{ChunkIdentifier, FileFingerprint};

/// # Chunk store service
///
/// Persists chunks in a per fingerprint staging area. The staging area is created
/// with the first chunk and removed once its upload is merged or abandoned.
#[async_trait]
pub trait ChunkStoreService: Send + Sync {
    /// Put a chunk into the staging area of `fingerprint`.
    ///
    /// A chunk with the same identifier is replaced, so retries are harmless.
    async fn stage(
        &self,
        fingerprint: &FileFingerprint,
        identifier: &ChunkIdentifier,
        source: ChunkSource,
    ) -> UploadResult<()>;

    /// Chunks staged for `fingerprint`, sorted by index.
    ///
    /// None if the staging area doesn't exist.
    async fn staged_chunks(
        &self,
        fingerprint: &FileFingerprint,
    ) -> UploadResult<Option<Vec<StagedChunk>>>;

    /// Delete one staged chunk. Deleting a missing chunk is fine.
    async fn remove_chunk(&self, chunk: &StagedChunk) -> UploadResult<()>;

    /// Delete the staging area of `fingerprint`, returns whether it existed.
    async fn remove_staging_area(&self, fingerprint: &FileFingerprint) -> UploadResult<bool>;
}
