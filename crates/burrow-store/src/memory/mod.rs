mod snapshot;
mod store;
mod transaction;

pub use snapshot::MemorySnapshot;
pub use store::MemoryStore;
pub use transaction::MemoryTransaction;

use std::ops::Bound;

use crate::error::StoreError;
use crate::store::KvIter;

use store::ColumnFamily;

/// Lazily iterate the entries of `data` that share `prefix` and sort at or
/// after `start`.
pub(crate) fn scan_range<'a>(data: &'a ColumnFamily, prefix: &[u8], start: &[u8]) -> KvIter<'a> {
    let lower = if start > prefix { start } else { prefix };
    let prefix_vec = prefix.to_vec();
    Box::new(
        data.range((Bound::Included(lower.to_vec()), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(&prefix_vec))
            .map(|(k, v)| Ok::<_, StoreError>((k.clone(), v.clone()))),
    )
}
