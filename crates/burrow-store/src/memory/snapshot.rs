use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{KvIter, ReadView, Snapshot};

use super::scan_range;
use super::store::{ColumnFamily, StoreState};

/// Owned point-in-time view of a [`MemoryStore`](super::MemoryStore).
///
/// Holds an `Arc` to one committed state; structural sharing in `imbl` keeps
/// this cheap no matter how large the store is.
#[derive(Clone)]
pub struct MemorySnapshot {
    state: Arc<StoreState>,
}

impl MemorySnapshot {
    pub(crate) fn new(state: Arc<StoreState>) -> Self {
        Self { state }
    }

    fn cf_data(&self, cf: &str) -> Result<&ColumnFamily, StoreError> {
        self.state
            .cfs
            .get(cf)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf.to_string()))
    }
}

impl ReadView for MemorySnapshot {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.cf_data(cf)?.get(key).cloned())
    }

    fn scan_prefix<'a>(&'a self, cf: &str, prefix: &[u8]) -> Result<KvIter<'a>, StoreError> {
        Ok(scan_range(self.cf_data(cf)?, prefix, prefix))
    }

    fn scan_from<'a>(
        &'a self,
        cf: &str,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<KvIter<'a>, StoreError> {
        Ok(scan_range(self.cf_data(cf)?, prefix, start))
    }
}

impl Snapshot for MemorySnapshot {
    fn sequence(&self) -> u64 {
        self.state.sequence
    }
}
