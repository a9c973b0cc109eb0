use std::collections::BTreeMap;

use burrow_engine::Mapping;
use burrow_store::{ReadView, Transaction};

use crate::error::DbError;

pub(crate) const SYS_CF: &str = "_sys";
const TYPE_PREFIX: &[u8] = b"__type__:";

fn type_key(name: &str) -> Vec<u8> {
    let mut key = TYPE_PREFIX.to_vec();
    key.extend_from_slice(name.as_bytes());
    key
}

/// Persisted type mappings, kept in the `_sys` column family.
pub(crate) struct Catalog;

impl Catalog {
    pub fn put_mapping<T: Transaction>(&self, txn: &T, mapping: &Mapping) -> Result<(), DbError> {
        let value = bson::serialize_to_vec(mapping)?;
        txn.put(SYS_CF, &type_key(mapping.type_name()), &value)?;
        Ok(())
    }

    pub fn load_mappings(&self, view: &dyn ReadView) -> Result<BTreeMap<String, Mapping>, DbError> {
        let mut mappings = BTreeMap::new();
        for result in view.scan_prefix(SYS_CF, TYPE_PREFIX)? {
            let (_, value) = result?;
            let mapping: Mapping = bson::deserialize_from_slice(&value)?;
            mappings.insert(mapping.type_name().to_string(), mapping);
        }
        Ok(mappings)
    }
}
