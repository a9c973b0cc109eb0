use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock, RwLockReadGuard};
use std::thread;
use std::time::Duration;

use arc_swap::ArcSwap;
use bson::Document;
use burrow_engine::{
    BlockWriter, EngineError, Mapping, PostingsEvaluator, SEGMENT_CF, Searcher, SegmentStats,
    TopLevelFilter, flatten,
};
use burrow_query::Query;
use burrow_store::{Snapshot, Store, StoreError, Transaction};

use crate::catalog::{Catalog, SYS_CF};
use crate::config::IndexConfig;
use crate::error::DbError;
use crate::result::{
    DeleteResponse, GetResponse, IndexResponse, IndexStatus, SearchHit, SearchResponse,
};

struct IndexInner<S: Store> {
    store: S,
    config: IndexConfig,
    catalog: Catalog,
    /// Registered types. Mappings are only ever added, so any mapping set
    /// covers every older snapshot.
    mappings: RwLock<BTreeMap<String, Mapping>>,
    /// The view searches run against, replaced on refresh.
    reader: ArcSwap<S::Snapshot>,
}

/// A nested-document index over a key-value store.
///
/// Writes commit immediately and are readable through [`Index::get`], but
/// searches and [`Index::status`] only see them after the next refresh.
pub struct Index<S: Store> {
    inner: Arc<IndexInner<S>>,
    refresh_handle: Option<RefreshHandle>,
}

impl<S: Store + Send + Sync + 'static> Index<S> {
    pub fn open(store: S, config: IndexConfig) -> Result<Self, DbError> {
        store.create_cf(SYS_CF)?;
        store.create_cf(SEGMENT_CF)?;
        let snapshot = store.snapshot()?;
        let mappings = Catalog.load_mappings(&snapshot)?;
        tracing::info!(
            types = mappings.len(),
            sequence = snapshot.sequence(),
            "opened index"
        );

        let inner = Arc::new(IndexInner {
            store,
            config,
            catalog: Catalog,
            mappings: RwLock::new(mappings),
            reader: ArcSwap::from_pointee(snapshot),
        });
        let refresh_handle = inner
            .config
            .refresh_interval()
            .map(|interval| RefreshHandle::spawn(Arc::clone(&inner), interval));

        Ok(Self {
            inner,
            refresh_handle,
        })
    }
}

impl<S: Store> Index<S> {
    // ── Mappings ────────────────────────────────────────────────

    /// Register `type_name` from a mapping declaration such as
    /// `{ "properties": { "nested1": { "type": "nested" } } }`.
    pub fn put_mapping(&self, type_name: &str, declaration: &Document) -> Result<(), DbError> {
        let mapping = Mapping::from_bson(type_name, declaration)?;
        self.register(mapping)
    }

    /// Register a type. Registering an identical mapping again is a no-op.
    pub fn register(&self, mapping: Mapping) -> Result<(), DbError> {
        let type_name = mapping.type_name().to_string();
        validate_type_name(&type_name)?;
        let limit = self.inner.config.max_nested_depth;
        if mapping.max_depth() > limit {
            return Err(EngineError::InvalidMapping(format!(
                "[{type_name}] nests {} levels, the limit is {limit}",
                mapping.max_depth()
            ))
            .into());
        }

        let mut mappings = self
            .inner
            .mappings
            .write()
            .map_err(|_| poisoned("mappings"))?;
        match mappings.get(&type_name) {
            Some(existing) if *existing == mapping => return Ok(()),
            Some(_) => return Err(DbError::MappingConflict(type_name)),
            None => {}
        }

        let txn = self.inner.store.begin(false)?;
        self.inner.catalog.put_mapping(&txn, &mapping)?;
        txn.commit()?;

        tracing::info!(
            type_name = %type_name,
            max_depth = mapping.max_depth(),
            nested_paths = ?mapping.nested_paths(),
            "registered type"
        );
        mappings.insert(type_name, mapping);
        Ok(())
    }

    pub fn mapping(&self, type_name: &str) -> Result<Option<Mapping>, DbError> {
        Ok(self.inner.mappings()?.get(type_name).cloned())
    }

    // ── Writes ──────────────────────────────────────────────────

    /// Index a logical document, replacing any previous version of it as a
    /// whole.
    pub fn index(
        &self,
        type_name: &str,
        id: &str,
        doc: &Document,
    ) -> Result<IndexResponse, DbError> {
        validate_id(id)?;
        let mapping = self.inner.require_mapping(type_name)?;
        // Flatten before taking the write lock; a malformed document
        // fails without touching the store.
        let block = flatten(&mapping, id, doc)?;

        let txn = self.inner.store.begin(false)?;
        let entry = BlockWriter::new(&txn).write(type_name, id, block)?;
        txn.commit()?;
        self.inner.refresh_after_write()?;

        Ok(IndexResponse {
            type_name: type_name.to_string(),
            id: id.to_string(),
            version: entry.version,
            created: entry.version == 1,
            num_docs: entry.block.num_docs(),
        })
    }

    /// Delete a logical document together with all of its nested documents.
    pub fn delete(&self, type_name: &str, id: &str) -> Result<DeleteResponse, DbError> {
        validate_id(id)?;
        self.inner.require_mapping(type_name)?;

        let txn = self.inner.store.begin(false)?;
        let removed = BlockWriter::new(&txn).delete(type_name, id)?;
        match removed {
            Some(_) => txn.commit()?,
            None => txn.rollback()?,
        }
        if removed.is_some() {
            self.inner.refresh_after_write()?;
        }

        Ok(DeleteResponse {
            type_name: type_name.to_string(),
            id: id.to_string(),
            found: removed.is_some(),
            num_docs: removed.map_or(0, |entry| entry.block.num_docs()),
        })
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Fetch the source of a logical document from the latest committed
    /// state, refreshed or not.
    pub fn get(&self, type_name: &str, id: &str) -> Result<Option<GetResponse>, DbError> {
        validate_id(id)?;
        let mappings = self.inner.mappings()?;
        if !mappings.contains_key(type_name) {
            return Err(DbError::TypeNotFound(type_name.to_string()));
        }
        let snapshot = self.inner.store.snapshot()?;
        let searcher = Searcher::new(&snapshot, &mappings, &PostingsEvaluator);
        let Some((entry, root)) = searcher.get(type_name, id)? else {
            return Ok(None);
        };
        Ok(Some(GetResponse {
            type_name: type_name.to_string(),
            id: id.to_string(),
            version: entry.version,
            source: root.source.unwrap_or_default(),
        }))
    }

    /// Search the refreshed view. An empty `types` searches every type.
    pub fn search(&self, types: &[&str], query: &Query) -> Result<SearchResponse, DbError> {
        let limit = self.inner.config.max_nested_depth;
        let depth = query.nesting_depth();
        if depth > limit {
            return Err(EngineError::InvalidQuery(format!(
                "[nested] query nests {depth} levels, the limit is {limit}"
            ))
            .into());
        }
        let mappings = self.inner.mappings()?;
        if let Some(missing) = types.iter().find(|t| !mappings.contains_key(**t)) {
            return Err(DbError::TypeNotFound(missing.to_string()));
        }
        let filter = TopLevelFilter::new(types.iter().map(|t| t.to_string()).collect());

        let reader = self.inner.reader.load_full();
        let searcher = Searcher::new(&*reader, &mappings, &PostingsEvaluator);
        let ordinals = searcher.search(query, &filter)?;

        let mut hits = Vec::with_capacity(ordinals.len());
        for ordinal in ordinals {
            let doc = searcher.load(ordinal)?.ok_or_else(|| EngineError::PartialBlock {
                ordinal,
                reason: "matched root is missing".into(),
            })?;
            hits.push(SearchHit {
                type_name: doc.type_name,
                id: doc.doc_id,
                ordinal,
            });
        }
        tracing::debug!(
            total_hits = hits.len(),
            sequence = reader.sequence(),
            "search"
        );
        Ok(SearchResponse {
            total_hits: hits.len() as u64,
            hits,
        })
    }

    /// Counters of the refreshed view.
    pub fn status(&self) -> Result<IndexStatus, DbError> {
        let reader = self.inner.reader.load_full();
        let stats = SegmentStats::load(&*reader)?;
        Ok(IndexStatus {
            num_docs: stats.num_docs,
            doc_count: stats.doc_count,
            max_ordinal: stats.next_ordinal,
            snapshot_sequence: reader.sequence(),
        })
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Make every committed write visible to searches. Returns the sequence
    /// of the published snapshot.
    pub fn refresh(&self) -> Result<u64, DbError> {
        self.inner.refresh()
    }

    /// Stop the background refresher, if any.
    pub fn shutdown(&mut self) {
        if let Some(mut handle) = self.refresh_handle.take() {
            handle.stop();
        }
    }
}

impl<S: Store> IndexInner<S> {
    fn mappings(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Mapping>>, DbError> {
        self.mappings.read().map_err(|_| poisoned("mappings"))
    }

    fn require_mapping(&self, type_name: &str) -> Result<Mapping, DbError> {
        self.mappings()?
            .get(type_name)
            .cloned()
            .ok_or_else(|| DbError::TypeNotFound(type_name.to_string()))
    }

    /// Publish the latest committed snapshot unless a newer or equal one is
    /// already published. Concurrent refreshers can finish out of order; the
    /// published sequence never goes backwards.
    fn refresh(&self) -> Result<u64, DbError> {
        let snapshot = self.store.snapshot()?;
        let sequence = snapshot.sequence();
        let current = self.reader.load().sequence();
        if current >= sequence {
            return Ok(current);
        }
        let stats = SegmentStats::load(&snapshot)?;
        let next = Arc::new(snapshot);
        let previous = self.reader.rcu(|published| {
            if published.sequence() >= sequence {
                Arc::clone(published)
            } else {
                Arc::clone(&next)
            }
        });
        if previous.sequence() >= sequence {
            return Ok(previous.sequence());
        }
        tracing::info!(sequence, num_docs = stats.num_docs, "refreshed");
        Ok(sequence)
    }

    fn refresh_after_write(&self) -> Result<(), DbError> {
        if self.config.refresh_on_write {
            self.refresh()?;
        }
        Ok(())
    }
}

fn poisoned(what: &'static str) -> DbError {
    DbError::Store(StoreError::Poisoned(what))
}

fn validate_id(id: &str) -> Result<(), DbError> {
    if id.is_empty() {
        return Err(DbError::InvalidId("id must not be empty".into()));
    }
    Ok(())
}

fn validate_type_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() || name.contains(['.', '\0']) {
        return Err(EngineError::InvalidMapping(format!("invalid type name [{name}]")).into());
    }
    Ok(())
}

// ── Background refresh ──────────────────────────────────────────

struct RefreshHandle {
    shutdown: Arc<AtomicBool>,
    notify: Arc<(Mutex<()>, Condvar)>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RefreshHandle {
    fn spawn<S: Store + Send + Sync + 'static>(
        inner: Arc<IndexInner<S>>,
        interval: Duration,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let notify = Arc::new((Mutex::new(()), Condvar::new()));
        let flag = Arc::clone(&shutdown);
        let wakeup = Arc::clone(&notify);
        let handle = thread::spawn(move || {
            loop {
                let (lock, cvar) = &*wakeup;
                let Ok(guard) = lock.lock() else {
                    break;
                };
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                if cvar.wait_timeout(guard, interval).is_err() {
                    break;
                }
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(e) = inner.refresh() {
                    tracing::warn!(error = %e, "background refresh failed");
                }
            }
        });

        Self {
            shutdown,
            notify,
            handle: Some(handle),
        }
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        {
            // Taken so the flag cannot flip between the refresher's check
            // and its wait.
            let _guard = self.notify.0.lock();
            self.notify.1.notify_one();
        }
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
