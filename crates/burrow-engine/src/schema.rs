use std::collections::BTreeMap;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One field declaration in a type mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub name: String,
    pub is_nested: bool,
    #[serde(default)]
    pub children: BTreeMap<String, SchemaNode>,
}

impl SchemaNode {
    /// A scalar or plain object field.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_nested: false,
            children: BTreeMap::new(),
        }
    }

    /// A field whose objects are indexed as separate physical documents.
    pub fn nested(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_nested: true,
            children: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.insert(child.name.clone(), child);
        self
    }

    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.get(name)
    }

    /// Longest chain of nested nodes at or below this node.
    fn nested_depth(&self) -> usize {
        let below = self
            .children
            .values()
            .map(SchemaNode::nested_depth)
            .max()
            .unwrap_or(0);
        below + usize::from(self.is_nested)
    }

    fn collect_nested_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for child in self.children.values() {
            let path = join_path(prefix, &child.name);
            if child.is_nested {
                out.push(path.clone());
            }
            child.collect_nested_paths(&path, out);
        }
    }
}

/// The schema of one document type: a tree of [`SchemaNode`]s rooted at the
/// type itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    type_name: String,
    root: SchemaNode,
    max_depth: usize,
}

impl Mapping {
    pub fn new(type_name: impl Into<String>, properties: Vec<SchemaNode>) -> Self {
        let type_name = type_name.into();
        let mut root = SchemaNode::object(type_name.clone());
        for node in properties {
            root = root.with_child(node);
        }
        let max_depth = root.nested_depth();
        Self {
            type_name,
            root,
            max_depth,
        }
    }

    /// Parse a mapping declaration.
    ///
    /// Accepts `{ "properties": { ... } }`, optionally wrapped in a
    /// `{ "<type>": { ... } }` envelope. Each property is a document with an
    /// optional `type` (`"nested"`, `"object"`, or any scalar type name) and
    /// optional `properties` for object and nested fields.
    pub fn from_bson(type_name: &str, declaration: &Document) -> Result<Self, EngineError> {
        let body = match declaration.get(type_name) {
            Some(Bson::Document(inner)) if !declaration.contains_key("properties") => inner,
            _ => declaration,
        };
        let properties = match body.get("properties") {
            None => Vec::new(),
            Some(Bson::Document(props)) => parse_properties(props, "")?,
            Some(other) => {
                return Err(EngineError::InvalidMapping(format!(
                    "properties of [{type_name}] must be a document, found {:?}",
                    other.element_type()
                )));
            }
        };
        Ok(Self::new(type_name, properties))
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Number of nested levels in the deepest branch, computed once at load.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Look up a node by dotted path, relative to the type root.
    pub fn node(&self, path: &str) -> Option<&SchemaNode> {
        if path.is_empty() {
            return None;
        }
        let mut node = &self.root;
        for segment in path.split('.') {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// Every nested path declared by this mapping, parents before children.
    pub fn nested_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_nested_paths("", &mut out);
        out
    }
}

fn parse_properties(props: &Document, prefix: &str) -> Result<Vec<SchemaNode>, EngineError> {
    let mut nodes = Vec::with_capacity(props.len());
    for (name, decl) in props {
        let path = join_path(prefix, name);
        if name.is_empty() || name.contains('.') {
            return Err(EngineError::InvalidMapping(format!(
                "invalid field name [{path}]"
            )));
        }
        let Bson::Document(decl) = decl else {
            return Err(EngineError::InvalidMapping(format!(
                "declaration of [{path}] must be a document"
            )));
        };
        let kind = match decl.get("type") {
            None => None,
            Some(Bson::String(s)) => Some(s.as_str()),
            Some(_) => {
                return Err(EngineError::InvalidMapping(format!(
                    "type of [{path}] must be a string"
                )));
            }
        };
        let children = match decl.get("properties") {
            None => Vec::new(),
            Some(Bson::Document(sub)) => parse_properties(sub, &path)?,
            Some(_) => {
                return Err(EngineError::InvalidMapping(format!(
                    "properties of [{path}] must be a document"
                )));
            }
        };
        let mut node = match kind {
            Some("nested") => SchemaNode::nested(name.as_str()),
            Some("object") | None => SchemaNode::object(name.as_str()),
            Some(scalar) => {
                if !children.is_empty() {
                    return Err(EngineError::InvalidMapping(format!(
                        "field [{path}] of type [{scalar}] cannot declare properties"
                    )));
                }
                SchemaNode::object(name.as_str())
            }
        };
        for child in children {
            node = node.with_child(child);
        }
        nodes.push(node);
    }
    Ok(nodes)
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
