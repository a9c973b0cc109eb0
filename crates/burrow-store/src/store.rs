use crate::error::StoreError;

/// Boxed key-value iterator returned by scans.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), StoreError>> + 'a>;

pub trait Store {
    type Txn<'a>: Transaction
    where
        Self: 'a;

    /// Immutable point-in-time view, independent of the store's lifetime.
    type Snapshot: Snapshot + Send + Sync + 'static;

    fn begin(&self, read_only: bool) -> Result<Self::Txn<'_>, StoreError>;

    /// Capture the latest committed state. Later commits are not visible
    /// through the returned snapshot.
    fn snapshot(&self) -> Result<Self::Snapshot, StoreError>;

    fn create_cf(&self, name: &str) -> Result<(), StoreError>;
    fn drop_cf(&self, name: &str) -> Result<(), StoreError>;
}

/// Read surface shared by transactions and snapshots.
///
/// Object safe, so engine code can evaluate queries against `&dyn ReadView`
/// without caring whether it reads a pinned snapshot or a live transaction.
pub trait ReadView {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn scan_prefix<'a>(&'a self, cf: &str, prefix: &[u8]) -> Result<KvIter<'a>, StoreError>;

    /// Scan keys that start with `prefix` and sort at or after `start`.
    ///
    /// `start` is a full key, not a suffix; keys before it are skipped even
    /// when they share the prefix.
    fn scan_from<'a>(
        &'a self,
        cf: &str,
        prefix: &[u8],
        start: &[u8],
    ) -> Result<KvIter<'a>, StoreError>;
}

pub trait Transaction: ReadView {
    // Writes
    fn put(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn put_batch(&self, cf: &str, entries: &[(&[u8], &[u8])]) -> Result<(), StoreError>;
    fn delete(&self, cf: &str, key: &[u8]) -> Result<(), StoreError>;
    fn delete_batch(&self, cf: &str, keys: &[&[u8]]) -> Result<(), StoreError>;

    // Schema
    fn create_cf(&mut self, name: &str) -> Result<(), StoreError>;

    // Lifecycle
    fn commit(self) -> Result<(), StoreError>;
    fn rollback(self) -> Result<(), StoreError>;
}

pub trait Snapshot: ReadView {
    /// Commit sequence this snapshot was taken at. Increases by one with
    /// every commit that changed data.
    fn sequence(&self) -> u64;
}
