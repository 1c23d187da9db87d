use crate::model::vo::ChunkIdentifier;

/// Whether an upload still needs chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// The artifact exists, nothing has to be uploaded.
    Complete,
    /// Chunks already staged, sorted by index.
    Incomplete { existing: Vec<ChunkIdentifier> },
}

impl UploadStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, UploadStatus::Complete)
    }
}
