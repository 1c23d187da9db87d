mod chunk_store;
mod completeness;
mod layout;
mod lock;
mod merge;
mod sweep;
mod upload;

#[rustfmt::skip]
pub use {
    chunk_store::LocalChunkStoreServiceImpl,
    completeness::CompletenessServiceImpl,
    layout::StorageLayout,
    lock::{FingerprintGuard, FingerprintLocks},
    merge::MergeServiceImpl,
    sweep::StagingSweepServiceImpl,
    upload::UploadServiceImpl,
};
