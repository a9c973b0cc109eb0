use burrow_store::{ReadView, Transaction};

use crate::document::{Block, BlockEntry, Ordinal, PhysicalDocument, ScalarValue};
use crate::encoding::key::{
    DOC_COUNT_KEY, NEXT_ORDINAL_KEY, NUM_DOCS_KEY, block_key, doc_key, encode_ordinal, nested_key,
    root_key, root_value, term_key,
};
use crate::encoding::value::encode_value;
use crate::encoding::{
    SEGMENT_CF, encode_block_entry, encode_counter, encode_document, load_block_entry,
    load_counter, load_document,
};
use crate::error::EngineError;

/// Field name of the combined `_all` postings.
pub const ALL_FIELD: &str = "_all";

// ── SegmentStats ───────────────────────────────────────────────

/// Counters of one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    /// Live physical documents: every root plus all of its nested descendants.
    pub num_docs: u64,
    /// Live logical documents.
    pub doc_count: u64,
    /// Next ordinal to hand out. Ordinals are never reused.
    pub next_ordinal: Ordinal,
}

impl SegmentStats {
    pub fn load(view: &dyn ReadView) -> Result<Self, EngineError> {
        Ok(Self {
            num_docs: load_counter(view, NUM_DOCS_KEY)?,
            doc_count: load_counter(view, DOC_COUNT_KEY)?,
            next_ordinal: load_counter(view, NEXT_ORDINAL_KEY)?,
        })
    }

    /// Take a removed block out of the counters. Counters too small to hold
    /// the block mean the segment is inconsistent.
    fn release(&mut self, block: &Block) -> Result<(), EngineError> {
        let num_docs = self.num_docs.checked_sub(block.num_docs());
        let doc_count = self.doc_count.checked_sub(1);
        let Some((num_docs, doc_count)) = num_docs.zip(doc_count) else {
            let err = EngineError::PartialBlock {
                ordinal: block.first,
                reason: format!(
                    "counters (num_docs {}, doc_count {}) do not cover block {}..={}",
                    self.num_docs, self.doc_count, block.first, block.last
                ),
            };
            tracing::error!(error = %err, "segment counters out of sync");
            return Err(err);
        };
        self.num_docs = num_docs;
        self.doc_count = doc_count;
        Ok(())
    }

    fn save<T: Transaction>(&self, txn: &T) -> Result<(), EngineError> {
        let num_docs = encode_counter(self.num_docs);
        let doc_count = encode_counter(self.doc_count);
        let next_ordinal = encode_counter(self.next_ordinal);
        txn.put_batch(
            SEGMENT_CF,
            &[
                (NUM_DOCS_KEY, num_docs.as_slice()),
                (DOC_COUNT_KEY, doc_count.as_slice()),
                (NEXT_ORDINAL_KEY, next_ordinal.as_slice()),
            ],
        )?;
        Ok(())
    }
}

// ── BlockWriter ────────────────────────────────────────────────

/// Writes and deletes whole blocks inside one write transaction.
///
/// Every ordinal of a block is allocated in the same transaction, and the
/// store holds its write lock until commit, so no other block can interleave.
/// Nothing written here is visible to snapshots taken before the commit.
pub struct BlockWriter<'t, T: Transaction> {
    txn: &'t T,
}

impl<'t, T: Transaction> BlockWriter<'t, T> {
    pub fn new(txn: &'t T) -> Self {
        Self { txn }
    }

    /// Registry entry of the live block for `(type_name, doc_id)`.
    pub fn lookup(&self, type_name: &str, doc_id: &str) -> Result<Option<BlockEntry>, EngineError> {
        load_block_entry(self.txn, type_name, doc_id)
    }

    pub fn stats(&self) -> Result<SegmentStats, EngineError> {
        SegmentStats::load(self.txn)
    }

    /// Write a flattened block, replacing any live block of the same
    /// logical document.
    ///
    /// `docs` must be in flatten order: every physical document belongs to
    /// `(type_name, doc_id)` and only the last one is a root.
    pub fn write(
        &self,
        type_name: &str,
        doc_id: &str,
        mut docs: Vec<PhysicalDocument>,
    ) -> Result<BlockEntry, EngineError> {
        let mut stats = self.stats()?;
        validate_block(type_name, doc_id, &docs, stats.next_ordinal)?;

        let previous = self.lookup(type_name, doc_id)?;
        if let Some(old) = previous {
            stats.release(&old.block)?;
            self.remove_block(&old.block)?;
        }
        stats.doc_count += 1;

        let first = stats.next_ordinal;
        let count = docs.len() as u64;
        let block = Block {
            first,
            last: first + count - 1,
        };

        for (ordinal, doc) in (first..).zip(docs.iter_mut()) {
            doc.ordinal = ordinal;
            let encoded = encode_document(doc)?;
            self.txn.put(SEGMENT_CF, &doc_key(ordinal), &encoded)?;

            let entries = index_entries(doc, first);
            let refs: Vec<(&[u8], &[u8])> = entries
                .iter()
                .map(|(k, v)| (k.as_slice(), v.as_slice()))
                .collect();
            self.txn.put_batch(SEGMENT_CF, &refs)?;
        }

        let entry = BlockEntry {
            block,
            version: previous.map_or(1, |old| old.version + 1),
        };
        self.txn.put(
            SEGMENT_CF,
            &block_key(type_name, doc_id),
            &encode_block_entry(&entry)?,
        )?;

        stats.next_ordinal = block.last + 1;
        stats.num_docs += count;
        stats.save(self.txn)?;

        tracing::debug!(
            type_name,
            doc_id,
            first = block.first,
            last = block.last,
            num_docs = count,
            version = entry.version,
            "wrote block"
        );
        Ok(entry)
    }

    /// Delete the whole block of a logical document. Returns the removed
    /// entry, or `None` when no live block exists.
    pub fn delete(&self, type_name: &str, doc_id: &str) -> Result<Option<BlockEntry>, EngineError> {
        let Some(entry) = self.lookup(type_name, doc_id)? else {
            return Ok(None);
        };
        let mut stats = self.stats()?;
        stats.release(&entry.block)?;

        self.remove_block(&entry.block)?;
        self.txn.delete(SEGMENT_CF, &block_key(type_name, doc_id))?;
        stats.save(self.txn)?;

        tracing::debug!(
            type_name,
            doc_id,
            first = entry.block.first,
            last = entry.block.last,
            num_docs = entry.block.num_docs(),
            "deleted block"
        );
        Ok(Some(entry))
    }

    /// Remove every physical document of `block` along with its postings
    /// and scope entries. The registry entry and counters are left to the
    /// caller.
    fn remove_block(&self, block: &Block) -> Result<(), EngineError> {
        let mut keys = Vec::new();
        for ordinal in block.first..=block.last {
            let doc = load_document(self.txn, ordinal)?.ok_or_else(|| {
                let err = EngineError::PartialBlock {
                    ordinal,
                    reason: format!("block {}..={} is missing a document", block.first, block.last),
                };
                tracing::error!(error = %err, "cannot remove block");
                err
            })?;
            keys.push(doc_key(ordinal));
            keys.extend(index_entries(&doc, block.first).into_iter().map(|(k, _)| k));
        }
        let refs: Vec<&[u8]> = keys.iter().map(Vec::as_slice).collect();
        self.txn.delete_batch(SEGMENT_CF, &refs)?;
        Ok(())
    }
}

/// Check the structural invariants of a block before any ordinal is spent.
fn validate_block(
    type_name: &str,
    doc_id: &str,
    docs: &[PhysicalDocument],
    next_ordinal: Ordinal,
) -> Result<(), EngineError> {
    let partial = |offset: usize, reason: String| EngineError::PartialBlock {
        ordinal: next_ordinal + offset as u64,
        reason,
    };
    let Some((root, children)) = docs.split_last() else {
        return Err(partial(0, "empty block".into()));
    };
    if !root.is_root() || root.path.is_some() {
        return Err(partial(docs.len() - 1, "last document is not a root".into()));
    }
    for (offset, doc) in children.iter().enumerate() {
        if doc.is_root() || doc.path.is_none() {
            return Err(partial(offset, "root document before the end of the block".into()));
        }
    }
    for (offset, doc) in docs.iter().enumerate() {
        if doc.type_name != type_name || doc.doc_id != doc_id {
            return Err(partial(
                offset,
                format!(
                    "document of {}/{} in block of {type_name}/{doc_id}",
                    doc.type_name, doc.doc_id
                ),
            ));
        }
    }
    Ok(())
}

/// Postings and scope entry of one physical document. Deleting a document
/// removes exactly the keys produced here.
fn index_entries(doc: &PhysicalDocument, first: Ordinal) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut entries = Vec::new();
    for (field, values) in &doc.fields {
        for value in values {
            entries.push((term_key(field, &encode_value(value), doc.ordinal), Vec::new()));
        }
    }
    for term in &doc.all {
        let value = encode_value(&ScalarValue::String(term.clone()));
        entries.push((term_key(ALL_FIELD, &value, doc.ordinal), Vec::new()));
    }
    match &doc.path {
        None => entries.push((root_key(doc.ordinal), root_value(first, &doc.type_name))),
        Some(path) => entries.push((
            nested_key(&doc.type_name, path, doc.ordinal),
            encode_ordinal(first).to_vec(),
        )),
    }
    entries
}
