#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Staged,
    /// The artifact already exists, the chunk was not stored.
    AlreadyComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The artifact already existed, storage wasn't touched.
    AlreadyComplete,
    Merged { size: u64 },
}
