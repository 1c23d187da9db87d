use std::path::PathBuf;

use crate::model::vo::ChunkIdentifier;

/// A chunk persisted in a staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChunk {
    pub identifier: ChunkIdentifier,
    /// Byte length recorded when the staging area was listed.
    pub len: u64,
    pub path: PathBuf,
}
