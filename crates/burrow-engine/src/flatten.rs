use std::collections::BTreeMap;

use bson::{Bson, Document};

use crate::document::{PhysicalDocument, ScalarValue};
use crate::error::EngineError;
use crate::schema::{Mapping, SchemaNode, join_path};
use crate::writer::ALL_FIELD;

/// Flatten a logical document into its block of physical documents.
///
/// Children come before their parents: every nested object is emitted after
/// all of its own nested descendants, descendants of earlier fields precede
/// those of later fields, array order is preserved, and the root is always
/// the last element. Ordinals are left at zero for the writer to assign.
pub fn flatten(
    mapping: &Mapping,
    doc_id: &str,
    doc: &Document,
) -> Result<Vec<PhysicalDocument>, EngineError> {
    let mut flattener = Flattener {
        type_name: mapping.type_name(),
        doc_id,
        out: Vec::new(),
    };
    flattener.emit(mapping.root(), doc, None, 0)?;

    let mut block = flattener.out;
    if let Some(root) = block.last_mut() {
        root.source = Some(doc.clone());
    }
    Ok(block)
}

/// Per-object accumulator: the fields of the physical document being built.
#[derive(Default)]
struct Fields {
    values: BTreeMap<String, Vec<ScalarValue>>,
    all: Vec<String>,
}

impl Fields {
    fn push(&mut self, field: String, value: ScalarValue) {
        self.all.push(value.to_string());
        self.values.entry(field).or_default().push(value);
    }
}

struct Flattener<'a> {
    type_name: &'a str,
    doc_id: &'a str,
    out: Vec<PhysicalDocument>,
}

impl Flattener<'_> {
    /// Emit one physical document for `obj` (after its nested descendants).
    /// Returns the `_all` terms of the whole subtree so the caller can fold
    /// them into its own document.
    fn emit(
        &mut self,
        node: &SchemaNode,
        obj: &Document,
        path: Option<&str>,
        depth: u32,
    ) -> Result<Vec<String>, EngineError> {
        let mut fields = Fields::default();
        let prefix = path.unwrap_or("");
        self.walk_object(Some(node), obj, prefix, depth, &mut fields)?;

        let all = fields.all;
        self.out.push(PhysicalDocument {
            ordinal: 0,
            depth,
            path: path.map(str::to_string),
            type_name: self.type_name.to_string(),
            doc_id: self.doc_id.to_string(),
            fields: fields.values,
            all: all.clone(),
            source: None,
        });
        Ok(all)
    }

    fn walk_object(
        &mut self,
        node: Option<&SchemaNode>,
        obj: &Document,
        prefix: &str,
        depth: u32,
        fields: &mut Fields,
    ) -> Result<(), EngineError> {
        for (key, value) in obj {
            check_field_name(prefix, key)?;
            let full = join_path(prefix, key);
            let child = node.and_then(|n| n.child(key));
            match child {
                Some(nested) if nested.is_nested => {
                    for element in nested_elements(&full, value)? {
                        let subtree = self.emit(nested, element, Some(&full), depth + 1)?;
                        fields.all.extend(subtree);
                    }
                }
                _ => self.walk_value(child, value, &full, depth, fields)?,
            }
        }
        Ok(())
    }

    fn walk_value(
        &mut self,
        node: Option<&SchemaNode>,
        value: &Bson,
        field: &str,
        depth: u32,
        fields: &mut Fields,
    ) -> Result<(), EngineError> {
        match value {
            Bson::Document(sub) => self.walk_object(node, sub, field, depth, fields),
            Bson::Array(items) => {
                for item in items {
                    self.walk_value(node, item, field, depth, fields)?;
                }
                Ok(())
            }
            other => {
                if let Some(scalar) = ScalarValue::from_bson(other) {
                    fields.push(field.to_string(), scalar);
                }
                Ok(())
            }
        }
    }
}

/// The objects held by a nested-declared field. A single object counts as a
/// one-element array; null and empty arrays hold none.
fn nested_elements<'v>(path: &str, value: &'v Bson) -> Result<Vec<&'v Document>, EngineError> {
    match value {
        Bson::Document(d) => Ok(vec![d]),
        Bson::Null => Ok(Vec::new()),
        Bson::Array(items) => items
            .iter()
            .map(|item| match item {
                Bson::Document(d) => Ok(d),
                other => Err(mismatch(path, other)),
            })
            .collect(),
        other => Err(mismatch(path, other)),
    }
}

/// Field names become part of posting keys, which use NUL as a separator.
/// `_all` at the top level is the combined field.
fn check_field_name(prefix: &str, key: &str) -> Result<(), EngineError> {
    if key.contains('\0') {
        return Err(EngineError::InvalidDocument(format!(
            "field name {key:?} under [{prefix}] contains a NUL byte"
        )));
    }
    if prefix.is_empty() && key == ALL_FIELD {
        return Err(EngineError::InvalidDocument(format!(
            "[{ALL_FIELD}] is reserved"
        )));
    }
    Ok(())
}

fn mismatch(path: &str, found: &Bson) -> EngineError {
    EngineError::SchemaMismatch {
        path: path.to_string(),
        found: format!("{:?}", found.element_type()),
    }
}
