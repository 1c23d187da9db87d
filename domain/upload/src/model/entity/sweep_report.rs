/// What a sweep of the storage root removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_staging_areas: usize,
    pub abandoned_merges: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired_staging_areas == 0 && self.abandoned_merges == 0
    }
}
