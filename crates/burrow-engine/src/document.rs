use std::collections::BTreeMap;
use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Position of a physical document within its segment.
pub type Ordinal = u64;

/// A single indexable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
}

impl ScalarValue {
    /// Convert a BSON value into its indexable form. Returns `None` for
    /// values that are stored in the source but not indexed (null, binary,
    /// documents, arrays, ...).
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::String(s) => Some(Self::String(s.clone())),
            Bson::Int32(i) => Some(Self::Int(*i as i64)),
            Bson::Int64(i) => Some(Self::Int(*i)),
            Bson::Double(d) => Some(Self::Double(*d)),
            Bson::Boolean(b) => Some(Self::Bool(*b)),
            Bson::DateTime(dt) => Some(Self::DateTime(dt.timestamp_millis())),
            Bson::ObjectId(oid) => Some(Self::String(oid.to_hex())),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::DateTime(ms) => write!(f, "{ms}"),
        }
    }
}

/// One flattened unit of a logical document: the root, or one nested object
/// instance at some depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalDocument {
    /// Assigned by the block writer; zero until written.
    pub ordinal: Ordinal,
    /// 0 for the root, otherwise the number of nested levels above it.
    pub depth: u32,
    /// Dotted nested path this document instantiates; `None` for the root.
    pub path: Option<String>,
    pub type_name: String,
    /// Id of the logical document that owns this block.
    pub doc_id: String,
    /// Fully qualified field name to indexed values.
    pub fields: BTreeMap<String, Vec<ScalarValue>>,
    /// Combined `_all` terms: values of this object and all its descendants.
    pub all: Vec<String>,
    /// Original logical document, kept on the root only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Document>,
}

impl PhysicalDocument {
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn values(&self, field: &str) -> &[ScalarValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Contiguous ordinal range of one logical document. `last` is the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub first: Ordinal,
    pub last: Ordinal,
}

impl Block {
    /// Physical documents in the block, root included.
    pub fn num_docs(&self) -> u64 {
        self.last - self.first + 1
    }

    pub fn root(&self) -> Ordinal {
        self.last
    }

    pub fn contains(&self, ordinal: Ordinal) -> bool {
        (self.first..=self.last).contains(&ordinal)
    }
}

/// Registry entry for a live logical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub block: Block,
    pub version: u64,
}
