//! Order-preserving encoding of indexed values: `[tag][bytes]`.
//!
//! Within one tag, lexicographic byte order equals value order.

use std::cmp::Ordering;

use crate::document::ScalarValue;

const TAG_STRING: u8 = b's';
const TAG_INT: u8 = b'i';
const TAG_DOUBLE: u8 = b'f';
const TAG_BOOL: u8 = b'b';
const TAG_DATETIME: u8 = b'd';

pub(crate) fn encode_value(value: &ScalarValue) -> Vec<u8> {
    match value {
        ScalarValue::String(s) => {
            let mut out = Vec::with_capacity(1 + s.len());
            out.push(TAG_STRING);
            out.extend_from_slice(s.as_bytes());
            out
        }
        ScalarValue::Int(i) => tagged(TAG_INT, encode_i64(*i)),
        ScalarValue::Double(d) => tagged(TAG_DOUBLE, encode_f64(*d)),
        ScalarValue::Bool(b) => vec![TAG_BOOL, *b as u8],
        ScalarValue::DateTime(ms) => tagged(TAG_DATETIME, encode_i64(*ms)),
    }
}

pub(crate) fn decode_value(bytes: &[u8]) -> Option<ScalarValue> {
    let (&tag, rest) = bytes.split_first()?;
    match tag {
        TAG_STRING => std::str::from_utf8(rest)
            .ok()
            .map(|s| ScalarValue::String(s.to_string())),
        TAG_INT => Some(ScalarValue::Int(decode_i64(rest)?)),
        TAG_DOUBLE => Some(ScalarValue::Double(decode_f64(rest)?)),
        TAG_BOOL => match rest {
            [b] => Some(ScalarValue::Bool(*b != 0)),
            _ => None,
        },
        TAG_DATETIME => Some(ScalarValue::DateTime(decode_i64(rest)?)),
        _ => None,
    }
}

/// Compare two indexed values. Integers and doubles compare numerically;
/// datetimes compare with integers as epoch milliseconds. Values of
/// unrelated kinds are incomparable.
pub(crate) fn compare_values(a: &ScalarValue, b: &ScalarValue) -> Option<Ordering> {
    use ScalarValue::*;
    match (a, b) {
        (String(x), String(y)) => Some(x.cmp(y)),
        (Int(x), Int(y)) => Some(x.cmp(y)),
        (Double(x), Double(y)) => x.partial_cmp(y),
        (Int(x), Double(y)) => (*x as f64).partial_cmp(y),
        (Double(x), Int(y)) => x.partial_cmp(&(*y as f64)),
        (Bool(x), Bool(y)) => Some(x.cmp(y)),
        (DateTime(x), DateTime(y)) | (DateTime(x), Int(y)) | (Int(x), DateTime(y)) => {
            Some(x.cmp(y))
        }
        _ => None,
    }
}

/// Encoded forms a term lookup for `value` has to probe: integral numbers
/// are indexed either as integers or as doubles depending on the source.
pub(crate) fn term_probes(value: &ScalarValue) -> Vec<Vec<u8>> {
    let mut probes = vec![encode_value(value)];
    match value {
        ScalarValue::Int(i) => probes.push(encode_value(&ScalarValue::Double(*i as f64))),
        ScalarValue::Double(d) if d.fract() == 0.0 && d.abs() < i64::MAX as f64 => {
            probes.push(encode_value(&ScalarValue::Int(*d as i64)));
        }
        _ => {}
    }
    probes
}

fn tagged(tag: u8, bytes: [u8; 8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    out.push(tag);
    out.extend_from_slice(&bytes);
    out
}

fn encode_i64(i: i64) -> [u8; 8] {
    // Flip the sign bit so signed integers sort correctly as unsigned bytes
    ((i as u64) ^ (1u64 << 63)).to_be_bytes()
}

fn decode_i64(bytes: &[u8]) -> Option<i64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some((u64::from_be_bytes(arr) ^ (1u64 << 63)) as i64)
}

fn encode_f64(f: f64) -> [u8; 8] {
    let bits = f.to_bits();
    // IEEE 754: flip all bits if negative, else flip sign bit only
    let sortable = if bits & (1u64 << 63) != 0 {
        !bits
    } else {
        bits ^ (1u64 << 63)
    };
    sortable.to_be_bytes()
}

fn decode_f64(bytes: &[u8]) -> Option<f64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    let sortable = u64::from_be_bytes(arr);
    let bits = if sortable & (1u64 << 63) != 0 {
        sortable ^ (1u64 << 63)
    } else {
        !sortable
    };
    Some(f64::from_bits(bits))
}
