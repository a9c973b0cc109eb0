use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::MutexGuard;

use crate::error::StoreError;
use crate::store::{KvIter, ReadView, Transaction};

use super::scan_range;
use super::store::{ColumnFamily, MemoryStore};

/// Private working copy of the column families a transaction touched.
struct Working {
    data: HashMap<String, ColumnFamily>,
}

impl Working {
    fn new(store: &MemoryStore) -> Self {
        // Copying the map clones one `OrdMap` root per CF; the trees are shared.
        Self {
            data: store.load().cfs.clone(),
        }
    }

    fn get_cf(&self, cf: &str) -> Result<&ColumnFamily, StoreError> {
        self.data
            .get(cf)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf.to_string()))
    }

    fn get_cf_mut(&mut self, cf: &str) -> Result<&mut ColumnFamily, StoreError> {
        self.data
            .get_mut(cf)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf.to_string()))
    }
}

pub struct MemoryTransaction<'a> {
    working: RefCell<Option<Working>>,
    /// CFs that have been written to.
    dirty: RefCell<HashSet<String>>,
    store: &'a MemoryStore,
    read_only: bool,
    /// Write lock held for the duration of a write transaction.
    _write_guard: Option<MutexGuard<'a, ()>>,
}

impl<'a> MemoryTransaction<'a> {
    pub(crate) fn new_read_only(store: &'a MemoryStore) -> Self {
        Self {
            working: RefCell::new(Some(Working::new(store))),
            dirty: RefCell::new(HashSet::new()),
            store,
            read_only: true,
            _write_guard: None,
        }
    }

    pub(crate) fn new_writable(store: &'a MemoryStore, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            working: RefCell::new(Some(Working::new(store))),
            dirty: RefCell::new(HashSet::new()),
            store,
            read_only: false,
            _write_guard: Some(guard),
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    fn with_cf_mut<R>(
        &self,
        cf: &str,
        f: impl FnOnce(&mut ColumnFamily) -> R,
    ) -> Result<R, StoreError> {
        self.check_writable()?;
        let mut working = self.working.borrow_mut();
        let working = working.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let data = working.get_cf_mut(cf)?;
        let out = f(data);
        self.dirty.borrow_mut().insert(cf.to_string());
        Ok(out)
    }

    fn collect_scan(
        &self,
        cf: &str,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<KvIter<'static>, StoreError> {
        let working = self.working.borrow();
        let working = working.as_ref().ok_or(StoreError::TransactionConsumed)?;
        let data = working.get_cf(cf)?;
        // The working copy lives behind a RefCell, so entries are copied out
        // rather than borrowed.
        let entries = scan_range(data, prefix, start).collect::<Vec<_>>();
        Ok(Box::new(entries.into_iter()))
    }
}

impl ReadView for MemoryTransaction<'_> {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let working = self.working.borrow();
        let working = working.as_ref().ok_or(StoreError::TransactionConsumed)?;
        Ok(working.get_cf(cf)?.get(key).cloned())
    }

    fn scan_prefix<'b>(&'b self, cf: &str, prefix: &[u8]) -> Result<KvIter<'b>, StoreError> {
        self.collect_scan(cf, prefix, prefix)
    }

    fn scan_from<'b>(
        &'b self,
        cf: &str,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<KvIter<'b>, StoreError> {
        self.collect_scan(cf, prefix, start)
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn put(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.with_cf_mut(cf, |data| {
            data.insert(key.to_vec(), value.to_vec());
        })
    }

    fn put_batch(&self, cf: &str, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError> {
        self.with_cf_mut(cf, |data| {
            for (key, value) in entries {
                data.insert(key.to_vec(), value.to_vec());
            }
        })
    }

    fn delete(&self, cf: &str, key: &[u8]) -> Result<(), StoreError> {
        self.with_cf_mut(cf, |data| {
            data.remove(key);
        })
    }

    fn delete_batch(&self, cf: &str, keys: &[&[u8]]) -> Result<(), StoreError> {
        self.with_cf_mut(cf, |data| {
            for key in keys {
                data.remove(*key);
            }
        })
    }

    fn create_cf(&mut self, name: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let working = self
            .working
            .get_mut()
            .as_mut()
            .ok_or(StoreError::TransactionConsumed)?;
        working
            .data
            .entry(name.to_string())
            .or_insert_with(ColumnFamily::new);
        self.dirty.get_mut().insert(name.to_string());
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let working = self
            .working
            .into_inner()
            .ok_or(StoreError::TransactionConsumed)?;

        if self.read_only {
            return Err(StoreError::ReadOnly);
        }

        let dirty_set = self.dirty.into_inner();
        let dirty: HashMap<String, ColumnFamily> = working
            .data
            .into_iter()
            .filter(|(name, _)| dirty_set.contains(name))
            .collect();

        if dirty.is_empty() {
            return Ok(());
        }

        self.store.commit(dirty, Vec::new());
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        if self.working.into_inner().is_none() {
            return Err(StoreError::TransactionConsumed);
        }
        Ok(())
    }
}
