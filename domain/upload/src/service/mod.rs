mod chunk_store;
mod completeness;
mod merge;
mod sweep;
mod upload;

#[rustfmt::skip]
pub use {
    chunk_store::ChunkStoreService,
    completeness::CompletenessService,
    merge::MergeService,
    sweep::StagingSweepService,
    upload::UploadService,
};
