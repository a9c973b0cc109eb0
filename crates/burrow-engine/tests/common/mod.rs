use std::collections::{BTreeMap, BTreeSet};

use bson::Document;
use burrow_engine::{
    BlockWriter, EngineError, Mapping, Ordinal, PostingsEvaluator, SEGMENT_CF, SchemaNode,
    Searcher, TopLevelFilter, flatten,
};
use burrow_query::Query;
use burrow_store::{MemorySnapshot, MemoryStore, Store, Transaction};

pub const TYPE: &str = "type1";

/// `type1` with `nested1` holding `nested2`.
pub fn two_level_mappings() -> BTreeMap<String, Mapping> {
    let mapping = Mapping::new(
        TYPE,
        vec![SchemaNode::nested("nested1").with_child(SchemaNode::nested("nested2"))],
    );
    BTreeMap::from([(TYPE.to_string(), mapping)])
}

pub fn segment_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.create_cf(SEGMENT_CF).unwrap();
    store
}

/// Flatten and write `docs` in one transaction.
pub fn write_docs(store: &MemoryStore, mappings: &BTreeMap<String, Mapping>, docs: &[(&str, Document)]) {
    let txn = store.begin(false).unwrap();
    let writer = BlockWriter::new(&txn);
    for (id, doc) in docs {
        let block = flatten(&mappings[TYPE], id, doc).unwrap();
        writer.write(TYPE, id, block).unwrap();
    }
    txn.commit().unwrap();
}

pub fn try_search(
    snap: &MemorySnapshot,
    mappings: &BTreeMap<String, Mapping>,
    query: &Query,
) -> Result<BTreeSet<Ordinal>, EngineError> {
    Searcher::new(snap, mappings, &PostingsEvaluator).search(query, &TopLevelFilter::new(Vec::new()))
}

/// Ids of the logical documents matching `query`.
pub fn search_ids(
    snap: &MemorySnapshot,
    mappings: &BTreeMap<String, Mapping>,
    query: &Query,
) -> Vec<String> {
    let searcher = Searcher::new(snap, mappings, &PostingsEvaluator);
    try_search(snap, mappings, query)
        .unwrap()
        .into_iter()
        .map(|ordinal| searcher.load(ordinal).unwrap().unwrap().doc_id)
        .collect()
}
