use std::collections::{BTreeMap, BTreeSet};

use burrow_store::ReadView;

use crate::encoding::SEGMENT_CF;
use crate::encoding::key::{ROOT_PREFIX, parse_root_value, trailing_ordinal};
use crate::error::EngineError;
use crate::searcher::Scope;

/// The standing exclusion of nested documents from ordinary queries.
///
/// Builds the outermost scope of a search: only root documents of the
/// requested types are candidates. Nested documents become reachable only
/// through a nested query, which replaces this scope for its inner clause.
#[derive(Debug, Clone)]
pub struct TopLevelFilter {
    types: Vec<String>,
}

impl TopLevelFilter {
    /// An empty type list admits roots of every type.
    pub fn new(types: Vec<String>) -> Self {
        Self { types }
    }

    pub fn admits(&self, type_name: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t == type_name)
    }

    /// Root documents visible in `view`.
    ///
    /// Every root is a scope member, since a nested match folds to the next
    /// root regardless of type, but only admitted roots are candidates.
    pub fn scope(&self, view: &dyn ReadView) -> Result<Scope, EngineError> {
        let mut members = BTreeMap::new();
        let mut candidates = BTreeSet::new();
        for entry in view.scan_prefix(SEGMENT_CF, ROOT_PREFIX)? {
            let (key, value) = entry?;
            let parsed = trailing_ordinal(&key).zip(parse_root_value(&value));
            let Some((ordinal, (first, type_name))) = parsed else {
                return Err(EngineError::PartialBlock {
                    ordinal: trailing_ordinal(&key).unwrap_or_default(),
                    reason: "malformed root entry".into(),
                });
            };
            members.insert(ordinal, first);
            if self.admits(type_name) {
                candidates.insert(ordinal);
            }
        }
        Ok(Scope::root(self.types.clone(), members, candidates))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use burrow_store::{MemoryStore, Store, Transaction};

    use super::*;
    use crate::flatten::flatten;
    use crate::schema::{Mapping, SchemaNode};
    use crate::writer::BlockWriter;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_cf(SEGMENT_CF).unwrap();
        let txn = store.begin(false).unwrap();
        let writer = BlockWriter::new(&txn);
        for (type_name, id) in [("type1", "1"), ("type2", "2")] {
            let mapping = Mapping::new(type_name, vec![SchemaNode::nested("nested1")]);
            let doc = doc! { "nested1": [{ "a": 1 }, { "a": 2 }] };
            writer
                .write(type_name, id, flatten(&mapping, id, &doc).unwrap())
                .unwrap();
        }
        txn.commit().unwrap();
        store
    }

    #[test]
    fn only_roots_are_candidates() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let scope = TopLevelFilter::new(Vec::new()).scope(&snap).unwrap();
        assert_eq!(scope.candidates(), &BTreeSet::from([2, 5]));
        assert!(scope.is_root());
    }

    #[test]
    fn type_restriction_keeps_all_roots_as_members() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let scope = TopLevelFilter::new(vec!["type2".into()])
            .scope(&snap)
            .unwrap();
        assert_eq!(scope.candidates(), &BTreeSet::from([5]));
        assert_eq!(scope.num_members(), 2);
    }
}
