use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use imbl::OrdMap;

use crate::error::StoreError;
use crate::store::Store;

use super::snapshot::MemorySnapshot;
use super::transaction::MemoryTransaction;

pub(crate) type ColumnFamily = OrdMap<Vec<u8>, Vec<u8>>;

/// Committed state: every column family plus the commit sequence it was
/// published at. Replaced wholesale on commit, so readers always see all
/// column families from the same commit.
#[derive(Clone, Default)]
pub(crate) struct StoreState {
    pub(crate) cfs: HashMap<String, ColumnFamily>,
    pub(crate) sequence: u64,
}

pub struct MemoryStore {
    state: ArcSwap<StoreState>,
    write_lock: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::new(Arc::new(StoreState::default())),
            write_lock: Mutex::new(()),
        }
    }

    /// Current committed state. Cheap: an `Arc` bump.
    pub(crate) fn load(&self) -> Arc<StoreState> {
        self.state.load_full()
    }

    pub(crate) fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Poisoned("write"))
    }

    /// Publish the dirty column families of a finished write transaction.
    ///
    /// Callers must hold the write lock, so the load-modify-store below never
    /// races with another commit.
    pub(crate) fn commit(&self, dirty: HashMap<String, ColumnFamily>, dropped: Vec<String>) {
        let current = self.state.load_full();
        let mut next = (*current).clone();
        for name in dropped {
            next.cfs.remove(&name);
        }
        for (name, data) in dirty {
            next.cfs.insert(name, data);
        }
        next.sequence += 1;
        self.state.store(Arc::new(next));
    }
}

impl Store for MemoryStore {
    type Txn<'a> = MemoryTransaction<'a>;
    type Snapshot = MemorySnapshot;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError> {
        if read_only {
            Ok(MemoryTransaction::new_read_only(self))
        } else {
            let guard = self.lock_writes()?;
            Ok(MemoryTransaction::new_writable(self, guard))
        }
    }

    fn snapshot(&self) -> Result<Self::Snapshot, StoreError> {
        Ok(MemorySnapshot::new(self.load()))
    }

    fn create_cf(&self, name: &str) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        if self.load().cfs.contains_key(name) {
            return Ok(());
        }
        let mut dirty = HashMap::new();
        dirty.insert(name.to_string(), OrdMap::new());
        self.commit(dirty, Vec::new());
        Ok(())
    }

    fn drop_cf(&self, name: &str) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        if !self.load().cfs.contains_key(name) {
            return Ok(());
        }
        self.commit(HashMap::new(), vec![name.to_string()]);
        Ok(())
    }
}
