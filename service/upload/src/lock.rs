use std::sync::Arc;

use dashmap::DashMap;
use domain_upload::model::vo::FileFingerprint;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Per fingerprint reader/writer locks inside one process.
///
/// Staging a chunk takes the lock shared, so chunks of one upload still arrive
/// concurrently. Merge, cancel and the sweeper remove staging areas and take it
/// exclusively. Entries live only while someone holds or waits for them.
#[derive(Default)]
pub struct FingerprintLocks {
    locks: DashMap<String, Arc<RwLock<()>>>,
}

impl FingerprintLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until nobody holds the lock of `fingerprint` and take it exclusively.
    pub async fn acquire(&self, fingerprint: &FileFingerprint) -> FingerprintGuard<'_> {
        let guard = self.entry(fingerprint).write_owned().await;
        self.guard(fingerprint, Some(guard), None)
    }

    /// Wait until no exclusive holder is left and take the lock shared.
    pub async fn share(&self, fingerprint: &FileFingerprint) -> FingerprintGuard<'_> {
        let guard = self.entry(fingerprint).read_owned().await;
        self.guard(fingerprint, None, Some(guard))
    }

    /// Take the lock of `fingerprint` exclusively if nobody holds it.
    pub fn try_acquire(&self, fingerprint: &FileFingerprint) -> Option<FingerprintGuard<'_>> {
        match self.entry(fingerprint).try_write_owned() {
            Ok(guard) => Some(self.guard(fingerprint, Some(guard), None)),
            Err(_) => {
                self.release(fingerprint.as_str());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn entry(&self, fingerprint: &FileFingerprint) -> Arc<RwLock<()>> {
        self.locks.entry(fingerprint.as_str().to_owned()).or_default().clone()
    }

    fn guard(
        &self,
        fingerprint: &FileFingerprint,
        exclusive: Option<OwnedRwLockWriteGuard<()>>,
        shared: Option<OwnedRwLockReadGuard<()>>,
    ) -> FingerprintGuard<'_> {
        FingerprintGuard {
            locks: self,
            key: fingerprint.as_str().to_owned(),
            exclusive,
            shared,
        }
    }

    // Only the map itself still references the lock when nobody holds or waits for it.
    fn release(&self, key: &str) {
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct FingerprintGuard<'a> {
    locks: &'a FingerprintLocks,
    key: String,
    exclusive: Option<OwnedRwLockWriteGuard<()>>,
    shared: Option<OwnedRwLockReadGuard<()>>,
}

impl Drop for FingerprintGuard<'_> {
    fn drop(&mut self) {
        drop(self.exclusive.take());
        drop(self.shared.take());
        self.locks.release(&self.key);
    }
}
