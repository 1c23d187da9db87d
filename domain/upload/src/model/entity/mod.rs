mod outcome;
mod staged_chunk;
mod sweep_report;
mod upload_status;

#[rustfmt::skip]
pub use {
    outcome::{MergeOutcome, StageOutcome},
    staged_chunk::StagedChunk,
    sweep_report::SweepReport,
    upload_status::UploadStatus,
};
