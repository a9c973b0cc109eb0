use std::collections::{BTreeMap, BTreeSet};

use burrow_query::{BoolQuery, Query};
use burrow_store::ReadView;

use crate::document::{BlockEntry, Ordinal, PhysicalDocument};
use crate::encoding::key::{decode_ordinal, nested_prefix, trailing_ordinal};
use crate::encoding::{SEGMENT_CF, load_block_entry, load_document};
use crate::error::EngineError;
use crate::filter::TopLevelFilter;
use crate::leaf::{LeafEvaluator, LeafQuery};
use crate::path::{ResolvedPath, resolve_nested};
use crate::schema::Mapping;

// ── Scope ──────────────────────────────────────────────────────

/// The physical documents a query clause is evaluated against.
///
/// At the top level these are root documents; inside a nested query, the
/// documents of the nested path. `members` maps every document of the level
/// to the first ordinal of its block, which is what folding a deeper match
/// back to this level checks against. `candidates` is the subset a clause
/// may actually match.
#[derive(Debug, Clone)]
pub struct Scope {
    level: Level,
    members: BTreeMap<Ordinal, Ordinal>,
    candidates: BTreeSet<Ordinal>,
}

#[derive(Debug, Clone)]
enum Level {
    Root { types: Vec<String> },
    Nested { paths: Vec<ResolvedPath>, depth: usize },
}

impl Scope {
    pub(crate) fn root(
        types: Vec<String>,
        members: BTreeMap<Ordinal, Ordinal>,
        candidates: BTreeSet<Ordinal>,
    ) -> Self {
        Self {
            level: Level::Root { types },
            members,
            candidates,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.level, Level::Root { .. })
    }

    /// Number of nested queries entered to reach this scope.
    pub fn depth(&self) -> usize {
        match &self.level {
            Level::Root { .. } => 0,
            Level::Nested { depth, .. } => *depth,
        }
    }

    pub fn candidates(&self) -> &BTreeSet<Ordinal> {
        &self.candidates
    }

    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    /// Map a matching document of a deeper level to its enclosing member:
    /// the first member after it, which has to start the same block.
    fn fold(&self, child: Ordinal, child_first: Ordinal) -> Result<Ordinal, EngineError> {
        let next = self.members.range(child + 1..).next();
        if let Some((&parent, &parent_first)) = next {
            if parent_first == child_first {
                return Ok(parent);
            }
        }
        let reason = match next {
            Some((parent, _)) => format!("next enclosing document {parent} is in another block"),
            None => "no enclosing document follows it".to_string(),
        };
        let err = EngineError::PartialBlock {
            ordinal: child,
            reason,
        };
        tracing::error!(error = %err, "block join failed");
        Err(err)
    }
}

// ── Searcher ───────────────────────────────────────────────────

/// Evaluates queries against one immutable view of a segment.
///
/// Read-only and reentrant: it holds no state besides borrowed inputs, so
/// concurrent searches on the same snapshot need no coordination.
pub struct Searcher<'a> {
    view: &'a dyn ReadView,
    mappings: &'a BTreeMap<String, Mapping>,
    leaf: &'a dyn LeafEvaluator,
}

impl<'a> Searcher<'a> {
    pub fn new(
        view: &'a dyn ReadView,
        mappings: &'a BTreeMap<String, Mapping>,
        leaf: &'a dyn LeafEvaluator,
    ) -> Self {
        Self {
            view,
            mappings,
            leaf,
        }
    }

    /// Root ordinals matching `query`, in index order.
    pub fn search(
        &self,
        query: &Query,
        filter: &TopLevelFilter,
    ) -> Result<BTreeSet<Ordinal>, EngineError> {
        let scope = filter.scope(self.view)?;
        self.evaluate(query, &scope)
    }

    pub fn load(&self, ordinal: Ordinal) -> Result<Option<PhysicalDocument>, EngineError> {
        load_document(self.view, ordinal)
    }

    /// Registry entry and root document of a logical document.
    pub fn get(
        &self,
        type_name: &str,
        doc_id: &str,
    ) -> Result<Option<(BlockEntry, PhysicalDocument)>, EngineError> {
        let Some(entry) = load_block_entry(self.view, type_name, doc_id)? else {
            return Ok(None);
        };
        match self.load(entry.block.root())? {
            Some(root) if root.is_root() => Ok(Some((entry, root))),
            _ => Err(EngineError::PartialBlock {
                ordinal: entry.block.root(),
                reason: format!("block of {type_name}/{doc_id} has no root"),
            }),
        }
    }

    /// Members of `scope` matching `query`.
    pub fn evaluate(&self, query: &Query, scope: &Scope) -> Result<BTreeSet<Ordinal>, EngineError> {
        match query {
            Query::MatchAll => Ok(scope.candidates.clone()),
            Query::Term { field, value } => self.leaf.evaluate(
                self.view,
                &LeafQuery::Term { field, value },
                &scope.candidates,
            ),
            Query::Range { field, bounds } => self.leaf.evaluate(
                self.view,
                &LeafQuery::Range { field, bounds },
                &scope.candidates,
            ),
            Query::Bool(bool_query) => self.evaluate_bool(bool_query, scope),
            Query::Nested { path, query } => self.execute_nested(path, query, scope),
        }
    }

    /// Block join: evaluate `query` against the documents of `path` and
    /// report each matching document's enclosing member of `scope`, once.
    pub fn execute_nested(
        &self,
        path: &str,
        query: &Query,
        scope: &Scope,
    ) -> Result<BTreeSet<Ordinal>, EngineError> {
        let children = self.child_scope(path, scope)?;
        let matched = self.evaluate(query, &children)?;

        let mut parents = BTreeSet::new();
        for child in matched {
            let Some(&first) = children.members.get(&child) else {
                continue;
            };
            let parent = scope.fold(child, first)?;
            if scope.candidates.contains(&parent) {
                parents.insert(parent);
            }
        }
        Ok(parents)
    }

    fn evaluate_bool(
        &self,
        query: &BoolQuery,
        scope: &Scope,
    ) -> Result<BTreeSet<Ordinal>, EngineError> {
        let mut matched: Option<BTreeSet<Ordinal>> = None;
        for clause in &query.must {
            let hits = self.evaluate(clause, scope)?;
            matched = Some(match matched {
                None => hits,
                Some(acc) => acc.intersection(&hits).copied().collect(),
            });
        }

        // Should clauses are evaluated even when optional so that a bad
        // path in any clause fails the query.
        let mut should = BTreeSet::new();
        for clause in &query.should {
            should.extend(self.evaluate(clause, scope)?);
        }

        let mut matched = match matched {
            Some(matched) => matched,
            None if !query.should.is_empty() => should,
            None => scope.candidates.clone(),
        };
        for clause in &query.must_not {
            let excluded = self.evaluate(clause, scope)?;
            matched.retain(|ordinal| !excluded.contains(ordinal));
        }
        Ok(matched)
    }

    /// Resolve `path` for every type `scope` covers and collect the nested
    /// documents it names.
    fn child_scope(&self, path: &str, scope: &Scope) -> Result<Scope, EngineError> {
        let mut resolved = Vec::new();
        let mut first_error = None;
        for (mapping, enclosing) in self.targets(scope) {
            match resolve_nested(mapping, path) {
                Ok(target) => {
                    if let Some(outer) = enclosing {
                        if !is_below(&target.path, outer) {
                            return Err(EngineError::InvalidQuery(format!(
                                "[nested] path [{path}] is not below the enclosing nested path [{outer}]"
                            )));
                        }
                    }
                    resolved.push(target);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if resolved.is_empty() {
            return Err(first_error.unwrap_or_else(|| EngineError::UnknownPath(path.to_string())));
        }

        let mut members = BTreeMap::new();
        for target in &resolved {
            let prefix = nested_prefix(&target.type_name, &target.path);
            for entry in self.view.scan_prefix(SEGMENT_CF, &prefix)? {
                let (key, value) = entry?;
                let (Some(ordinal), Some(first)) = (trailing_ordinal(&key), decode_ordinal(&value))
                else {
                    return Err(EngineError::PartialBlock {
                        ordinal: trailing_ordinal(&key).unwrap_or_default(),
                        reason: format!("malformed scope entry for [{}]", target.path),
                    });
                };
                members.insert(ordinal, first);
            }
        }
        let candidates = members.keys().copied().collect();
        Ok(Scope {
            level: Level::Nested {
                paths: resolved,
                depth: scope.depth() + 1,
            },
            members,
            candidates,
        })
    }

    /// Mappings a nested path is resolved against, each with the nested
    /// path it has to lie below.
    fn targets<'s>(&'s self, scope: &'s Scope) -> Vec<(&'s Mapping, Option<&'s str>)> {
        match &scope.level {
            Level::Root { types } if types.is_empty() => {
                self.mappings.values().map(|m| (m, None)).collect()
            }
            Level::Root { types } => types
                .iter()
                .filter_map(|t| self.mappings.get(t))
                .map(|m| (m, None))
                .collect(),
            Level::Nested { paths, .. } => paths
                .iter()
                .filter_map(|p| {
                    self.mappings
                        .get(&p.type_name)
                        .map(|m| (m, Some(p.path.as_str())))
                })
                .collect(),
        }
    }
}

fn is_below(path: &str, outer: &str) -> bool {
    path.strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('.'))
}
