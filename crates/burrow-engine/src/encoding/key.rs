//! Key layout of the segment column family.
//!
//! - `d:{ordinal}` → serialized [`PhysicalDocument`](crate::PhysicalDocument)
//! - `r:{ordinal}` → `{first}{type}`: root scope entry
//! - `n:{type}\x00{path}\x00{ordinal}` → `{first}`: nested scope entry
//! - `t:{field}\x00{value}{ordinal}` → []: posting
//! - `b:{type}\x00{id}` → serialized [`BlockEntry`](crate::BlockEntry)
//! - `m:{name}` → 8-byte big-endian counter
//!
//! Ordinals are 8-byte big-endian so key order is ordinal order, and
//! `{first}` is the first ordinal of the owning block.

use crate::document::Ordinal;

pub(crate) const DOC_PREFIX: &[u8] = b"d:";
pub(crate) const ROOT_PREFIX: &[u8] = b"r:";
const NESTED_PREFIX: &[u8] = b"n:";
const TERM_PREFIX: &[u8] = b"t:";
const BLOCK_PREFIX: &[u8] = b"b:";
const SEP: u8 = 0x00;

pub(crate) const NEXT_ORDINAL_KEY: &[u8] = b"m:next_ordinal";
pub(crate) const NUM_DOCS_KEY: &[u8] = b"m:num_docs";
pub(crate) const DOC_COUNT_KEY: &[u8] = b"m:doc_count";

pub(crate) const ORDINAL_LEN: usize = 8;

pub(crate) fn encode_ordinal(ordinal: Ordinal) -> [u8; ORDINAL_LEN] {
    ordinal.to_be_bytes()
}

pub(crate) fn decode_ordinal(bytes: &[u8]) -> Option<Ordinal> {
    let arr: [u8; ORDINAL_LEN] = bytes.get(..ORDINAL_LEN)?.try_into().ok()?;
    Some(Ordinal::from_be_bytes(arr))
}

/// The ordinal stored in the last eight bytes of a key.
pub(crate) fn trailing_ordinal(key: &[u8]) -> Option<Ordinal> {
    let start = key.len().checked_sub(ORDINAL_LEN)?;
    decode_ordinal(&key[start..])
}

fn with_ordinal(mut key: Vec<u8>, ordinal: Ordinal) -> Vec<u8> {
    key.extend_from_slice(&encode_ordinal(ordinal));
    key
}

pub(crate) fn doc_key(ordinal: Ordinal) -> Vec<u8> {
    with_ordinal(DOC_PREFIX.to_vec(), ordinal)
}

pub(crate) fn root_key(ordinal: Ordinal) -> Vec<u8> {
    with_ordinal(ROOT_PREFIX.to_vec(), ordinal)
}

pub(crate) fn root_value(first: Ordinal, type_name: &str) -> Vec<u8> {
    let mut value = encode_ordinal(first).to_vec();
    value.extend_from_slice(type_name.as_bytes());
    value
}

/// Split a root scope value into `(first, type)`.
pub(crate) fn parse_root_value(value: &[u8]) -> Option<(Ordinal, &str)> {
    let first = decode_ordinal(value)?;
    let type_name = std::str::from_utf8(&value[ORDINAL_LEN..]).ok()?;
    Some((first, type_name))
}

/// `n:{type}\x00{path}\x00`
pub(crate) fn nested_prefix(type_name: &str, path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(NESTED_PREFIX.len() + type_name.len() + path.len() + 2);
    key.extend_from_slice(NESTED_PREFIX);
    key.extend_from_slice(type_name.as_bytes());
    key.push(SEP);
    key.extend_from_slice(path.as_bytes());
    key.push(SEP);
    key
}

pub(crate) fn nested_key(type_name: &str, path: &str, ordinal: Ordinal) -> Vec<u8> {
    with_ordinal(nested_prefix(type_name, path), ordinal)
}

/// `t:{field}\x00`
pub(crate) fn term_field_prefix(field: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(TERM_PREFIX.len() + field.len() + 1);
    key.extend_from_slice(TERM_PREFIX);
    key.extend_from_slice(field.as_bytes());
    key.push(SEP);
    key
}

/// `t:{field}\x00{value}`. Value encodings are not self-delimiting, so a
/// scan of this prefix also returns longer values; callers keep only keys
/// exactly [`ORDINAL_LEN`] bytes longer than the prefix.
pub(crate) fn term_value_prefix(field: &str, encoded_value: &[u8]) -> Vec<u8> {
    let mut key = term_field_prefix(field);
    key.extend_from_slice(encoded_value);
    key
}

pub(crate) fn term_key(field: &str, encoded_value: &[u8], ordinal: Ordinal) -> Vec<u8> {
    with_ordinal(term_value_prefix(field, encoded_value), ordinal)
}

pub(crate) fn block_key(type_name: &str, doc_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(BLOCK_PREFIX.len() + type_name.len() + 1 + doc_id.len());
    key.extend_from_slice(BLOCK_PREFIX);
    key.extend_from_slice(type_name.as_bytes());
    key.push(SEP);
    key.extend_from_slice(doc_id.as_bytes());
    key
}
