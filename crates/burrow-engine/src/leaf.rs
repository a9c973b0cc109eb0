use std::cmp::Ordering;
use std::collections::BTreeSet;

use bson::Bson;
use burrow_query::RangeBounds;
use burrow_store::ReadView;

use crate::document::{Ordinal, ScalarValue};
use crate::encoding::SEGMENT_CF;
use crate::encoding::key::{ORDINAL_LEN, term_field_prefix, term_value_prefix, trailing_ordinal};
use crate::encoding::value::{compare_values, decode_value, term_probes};
use crate::error::EngineError;

/// A single-field condition handed to a [`LeafEvaluator`].
#[derive(Debug, Clone, Copy)]
pub enum LeafQuery<'q> {
    Term { field: &'q str, value: &'q Bson },
    Range { field: &'q str, bounds: &'q RangeBounds },
}

/// Evaluates leaf conditions against stored postings.
///
/// Implementations only return ordinals contained in `filter`; the caller
/// owns scoping (which physical documents a clause may match).
pub trait LeafEvaluator: Send + Sync {
    fn evaluate(
        &self,
        view: &dyn ReadView,
        leaf: &LeafQuery<'_>,
        filter: &BTreeSet<Ordinal>,
    ) -> Result<BTreeSet<Ordinal>, EngineError>;
}

/// Leaf evaluator over the segment's `t:` postings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostingsEvaluator;

impl LeafEvaluator for PostingsEvaluator {
    fn evaluate(
        &self,
        view: &dyn ReadView,
        leaf: &LeafQuery<'_>,
        filter: &BTreeSet<Ordinal>,
    ) -> Result<BTreeSet<Ordinal>, EngineError> {
        if filter.is_empty() {
            return Ok(BTreeSet::new());
        }
        match *leaf {
            LeafQuery::Term { field, value } => term(view, field, value, filter),
            LeafQuery::Range { field, bounds } => range(view, field, bounds, filter),
        }
    }
}

fn term(
    view: &dyn ReadView,
    field: &str,
    value: &Bson,
    filter: &BTreeSet<Ordinal>,
) -> Result<BTreeSet<Ordinal>, EngineError> {
    let scalar = leaf_value(field, value)?;
    let mut out = BTreeSet::new();
    for probe in term_probes(&scalar) {
        let prefix = term_value_prefix(field, &probe);
        for entry in view.scan_prefix(SEGMENT_CF, &prefix)? {
            let (key, _) = entry?;
            // Longer values share the prefix; the ordinal must follow directly.
            if key.len() != prefix.len() + ORDINAL_LEN {
                continue;
            }
            if let Some(ordinal) = trailing_ordinal(&key).filter(|o| filter.contains(o)) {
                out.insert(ordinal);
            }
        }
    }
    Ok(out)
}

fn range(
    view: &dyn ReadView,
    field: &str,
    bounds: &RangeBounds,
    filter: &BTreeSet<Ordinal>,
) -> Result<BTreeSet<Ordinal>, EngineError> {
    let checks = RangeChecks::new(field, bounds)?;
    let prefix = term_field_prefix(field);
    let mut out = BTreeSet::new();
    for entry in view.scan_prefix(SEGMENT_CF, &prefix)? {
        let (key, _) = entry?;
        let Some(value_len) = key.len().checked_sub(prefix.len() + ORDINAL_LEN) else {
            continue;
        };
        let Some(ordinal) = trailing_ordinal(&key).filter(|o| filter.contains(o)) else {
            continue;
        };
        let encoded = &key[prefix.len()..prefix.len() + value_len];
        if decode_value(encoded).is_some_and(|v| checks.accepts(&v)) {
            out.insert(ordinal);
        }
    }
    Ok(out)
}

fn leaf_value(field: &str, value: &Bson) -> Result<ScalarValue, EngineError> {
    ScalarValue::from_bson(value).ok_or_else(|| {
        EngineError::InvalidQuery(format!(
            "unsupported value of type {:?} for field [{field}]",
            value.element_type()
        ))
    })
}

/// Resolved bounds of a range query.
struct RangeChecks {
    lower: Option<(ScalarValue, bool)>,
    upper: Option<(ScalarValue, bool)>,
}

impl RangeChecks {
    fn new(field: &str, bounds: &RangeBounds) -> Result<Self, EngineError> {
        Ok(Self {
            lower: Self::side(field, &bounds.gt, &bounds.gte)?,
            upper: Self::side(field, &bounds.lt, &bounds.lte)?,
        })
    }

    fn side(
        field: &str,
        exclusive: &Option<Bson>,
        inclusive: &Option<Bson>,
    ) -> Result<Option<(ScalarValue, bool)>, EngineError> {
        match (exclusive, inclusive) {
            (Some(_), Some(_)) => Err(EngineError::InvalidQuery(format!(
                "range on [{field}] has two bounds on the same side"
            ))),
            (Some(v), None) => Ok(Some((leaf_value(field, v)?, false))),
            (None, Some(v)) => Ok(Some((leaf_value(field, v)?, true))),
            (None, None) => Ok(None),
        }
    }

    fn accepts(&self, value: &ScalarValue) -> bool {
        if let Some((bound, inclusive)) = &self.lower {
            match compare_values(value, bound) {
                Some(Ordering::Greater) => {}
                Some(Ordering::Equal) if *inclusive => {}
                _ => return false,
            }
        }
        if let Some((bound, inclusive)) = &self.upper {
            match compare_values(value, bound) {
                Some(Ordering::Less) => {}
                Some(Ordering::Equal) if *inclusive => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use burrow_store::{MemoryStore, Store, Transaction};

    use super::*;
    use crate::encoding::key::term_key;
    use crate::encoding::value::encode_value;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_cf(SEGMENT_CF).unwrap();
        let txn = store.begin(false).unwrap();
        let postings = [
            ("n", ScalarValue::Int(1), 0),
            ("n", ScalarValue::Int(5), 1),
            ("n", ScalarValue::Double(7.5), 2),
            ("n", ScalarValue::Int(10), 3),
            ("s", ScalarValue::String("ab".into()), 4),
            ("s", ScalarValue::String("abc".into()), 5),
        ];
        for (field, value, ordinal) in postings {
            txn.put(SEGMENT_CF, &term_key(field, &encode_value(&value), ordinal), b"")
                .unwrap();
        }
        txn.commit().unwrap();
        store
    }

    fn all() -> BTreeSet<Ordinal> {
        (0..10).collect()
    }

    #[test]
    fn term_does_not_match_longer_values() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let value = Bson::String("ab".into());
        let leaf = LeafQuery::Term { field: "s", value: &value };
        let hits = PostingsEvaluator.evaluate(&snap, &leaf, &all()).unwrap();
        assert_eq!(hits, BTreeSet::from([4]));
    }

    #[test]
    fn term_respects_filter() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let value = Bson::Int32(5);
        let leaf = LeafQuery::Term { field: "n", value: &value };
        assert_eq!(
            PostingsEvaluator.evaluate(&snap, &leaf, &all()).unwrap(),
            BTreeSet::from([1])
        );
        assert!(
            PostingsEvaluator
                .evaluate(&snap, &leaf, &BTreeSet::from([0, 2]))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn integral_double_term_matches_int_posting() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let value = Bson::Double(10.0);
        let leaf = LeafQuery::Term { field: "n", value: &value };
        assert_eq!(
            PostingsEvaluator.evaluate(&snap, &leaf, &all()).unwrap(),
            BTreeSet::from([3])
        );
    }

    #[test]
    fn range_compares_numerically_across_kinds() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let bounds = RangeBounds::default().gte(5).lt(10);
        let leaf = LeafQuery::Range { field: "n", bounds: &bounds };
        assert_eq!(
            PostingsEvaluator.evaluate(&snap, &leaf, &all()).unwrap(),
            BTreeSet::from([1, 2])
        );
    }

    #[test]
    fn range_with_conflicting_bounds_is_invalid() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let bounds = RangeBounds::default().gt(1).gte(2);
        let leaf = LeafQuery::Range { field: "n", bounds: &bounds };
        let err = PostingsEvaluator.evaluate(&snap, &leaf, &all()).unwrap_err();
        assert!(err.is_query_error());
    }

    #[test]
    fn null_term_is_invalid() {
        let store = seeded();
        let snap = store.snapshot().unwrap();
        let leaf = LeafQuery::Term { field: "n", value: &Bson::Null };
        assert!(matches!(
            PostingsEvaluator.evaluate(&snap, &leaf, &all()),
            Err(EngineError::InvalidQuery(_))
        ));
    }
}
