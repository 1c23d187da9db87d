pub type UploadResult<T> = Result<T, UploadException>;

#[derive(Debug, thiserror::Error)]
pub enum UploadException {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("The upload with fingerprint: {fingerprint} has no staging area left, it must be restarted from the first chunk.")]
    UploadExpired { fingerprint: String },

    #[error("The upload with fingerprint: {fingerprint} is missing chunks: {missing:?}.")]
    MissingChunks { fingerprint: String, missing: Vec<u64> },

    #[error("Chunk: {identifier} has {actual} bytes, which doesn't fit declared chunk size: {declared}.")]
    ChunkSizeMismatch {
        identifier: String,
        declared: u64,
        actual: u64,
    },

    #[error("Merging upload with fingerprint: {fingerprint} didn't finish within {secs} seconds.")]
    MergeTimedOut { fingerprint: String, secs: u64 },

    #[error("Storage fault: {source}")]
    StorageFault {
        #[source]
        source: anyhow::Error,
    },
}

impl UploadException {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for UploadException {
    fn from(e: anyhow::Error) -> Self {
        UploadException::StorageFault { source: e }
    }
}

impl From<std::io::Error> for UploadException {
    fn from(e: std::io::Error) -> Self {
        UploadException::StorageFault { source: e.into() }
    }
}
