pub(crate) mod key;
pub(crate) mod value;

use burrow_store::{ReadView, StoreError};

use crate::document::{BlockEntry, Ordinal, PhysicalDocument};
use crate::error::EngineError;

/// Column family holding one segment: documents, postings, scope entries,
/// the block registry and counters.
pub const SEGMENT_CF: &str = "segment";

// ── Values ─────────────────────────────────────────────────────

pub(crate) fn encode_document(doc: &PhysicalDocument) -> Result<Vec<u8>, EngineError> {
    Ok(bson::serialize_to_vec(doc)?)
}

pub(crate) fn encode_block_entry(entry: &BlockEntry) -> Result<Vec<u8>, EngineError> {
    Ok(bson::serialize_to_vec(entry)?)
}

pub(crate) fn encode_counter(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

fn decode_counter(key: &[u8], data: &[u8]) -> Result<u64, EngineError> {
    let arr: [u8; 8] = data.try_into().map_err(|_| {
        StoreError::Corrupt {
            cf: SEGMENT_CF.to_string(),
            reason: format!(
                "counter {} has {} bytes",
                String::from_utf8_lossy(key),
                data.len()
            ),
        }
    })?;
    Ok(u64::from_be_bytes(arr))
}

// ── Loads ──────────────────────────────────────────────────────

pub(crate) fn load_document(
    view: &dyn ReadView,
    ordinal: Ordinal,
) -> Result<Option<PhysicalDocument>, EngineError> {
    match view.get(SEGMENT_CF, &key::doc_key(ordinal))? {
        None => Ok(None),
        Some(data) => Ok(Some(bson::deserialize_from_slice(&data)?)),
    }
}

pub(crate) fn load_block_entry(
    view: &dyn ReadView,
    type_name: &str,
    doc_id: &str,
) -> Result<Option<BlockEntry>, EngineError> {
    match view.get(SEGMENT_CF, &key::block_key(type_name, doc_id))? {
        None => Ok(None),
        Some(data) => Ok(Some(bson::deserialize_from_slice(&data)?)),
    }
}

/// Read a counter; an absent counter is zero.
pub(crate) fn load_counter(view: &dyn ReadView, key: &[u8]) -> Result<u64, EngineError> {
    match view.get(SEGMENT_CF, key)? {
        None => Ok(0),
        Some(data) => decode_counter(key, &data),
    }
}
