use bson::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub type_name: String,
    pub id: String,
    pub version: u64,
    /// False when an existing document was replaced.
    pub created: bool,
    /// Physical documents written: the root plus every nested object.
    pub num_docs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub type_name: String,
    pub id: String,
    pub found: bool,
    /// Physical documents removed with the block.
    pub num_docs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    pub type_name: String,
    pub id: String,
    pub version: u64,
    pub source: Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub type_name: String,
    pub id: String,
    pub ordinal: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_hits: u64,
    pub hits: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

/// Counters of the last refreshed view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Physical documents, nested ones included.
    pub num_docs: u64,
    /// Logical documents.
    pub doc_count: u64,
    /// Highest ordinal ever assigned plus one.
    pub max_ordinal: u64,
    pub snapshot_sequence: u64,
}
