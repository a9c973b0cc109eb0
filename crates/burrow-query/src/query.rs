use bson::Bson;
use serde::{Deserialize, Serialize};

/// A composable search query.
///
/// The variant set is closed: leaves (`Term`, `Range`, `MatchAll`) are handed
/// to a leaf evaluator, `Bool` combines clauses evaluated in the same scope,
/// and `Nested` switches the scope to the documents of a nested path and maps
/// matches back to their enclosing documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    MatchAll,
    Term { field: String, value: Bson },
    Range { field: String, bounds: RangeBounds },
    Bool(BoolQuery),
    Nested { path: String, query: Box<Query> },
}

impl Query {
    /// Deepest chain of `Nested` queries inside this query.
    pub fn nesting_depth(&self) -> usize {
        match self {
            Query::Nested { query, .. } => 1 + query.nesting_depth(),
            Query::Bool(b) => b
                .must
                .iter()
                .chain(&b.should)
                .chain(&b.must_not)
                .map(Query::nesting_depth)
                .max()
                .unwrap_or(0),
            _ => 0,
        }
    }
}

/// Boolean combination of clauses.
///
/// `must` clauses all have to match, `must_not` clauses must not match.
/// `should` clauses are optional when any `must` clause is present; otherwise
/// at least one of them has to match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default)]
    pub must: Vec<Query>,
    #[serde(default)]
    pub should: Vec<Query>,
    #[serde(default)]
    pub must_not: Vec<Query>,
}

/// One- or two-sided range; a missing bound is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Bson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Bson>,
}
