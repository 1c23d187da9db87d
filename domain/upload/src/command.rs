use std::path::PathBuf;

use crate::model::vo::{ChunkIdentifier, FileFingerprint};

/// Where the bytes of an arriving chunk come from.
#[derive(Debug)]
pub enum ChunkSource {
    /// A file the transport already materialized. It is moved, not copied, when possible.
    TempFile(PathBuf),
    /// Bytes held in memory.
    Bytes(Vec<u8>),
}

/// Stage one chunk of an upload.
#[derive(Debug)]
pub struct StageChunkCommand {
    pub fingerprint: FileFingerprint,
    pub identifier: ChunkIdentifier,
    pub source: ChunkSource,
    /// Original file name. When given, chunks of finished uploads are not stored again.
    pub file_name: Option<String>,
}

/// Merge every staged chunk of an upload into its artifact.
#[derive(Debug, Clone)]
pub struct MergeCommand {
    pub fingerprint: FileFingerprint,
    pub file_name: String,
    /// Size every chunk but the last one was cut to.
    pub declared_chunk_size: u64,
}
