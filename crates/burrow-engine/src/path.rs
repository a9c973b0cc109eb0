use crate::error::EngineError;
use crate::schema::{Mapping, SchemaNode};

/// A dotted path resolved against a type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub type_name: String,
    /// Path relative to the type root, without any type prefix.
    pub path: String,
    pub is_nested: bool,
    /// Number of nested nodes on the path, the target included.
    pub depth: usize,
}

/// Resolve `path` against `mapping`.
///
/// The path may carry the mapping's type name as a leading segment:
/// `"nested1"` and `"type1.nested1"` resolve identically for type `type1`.
/// The un-prefixed reading wins when both would match.
pub fn resolve(mapping: &Mapping, path: &str) -> Result<ResolvedPath, EngineError> {
    if let Some(resolved) = walk(mapping, path) {
        return Ok(resolved);
    }
    let stripped = path
        .strip_prefix(mapping.type_name())
        .and_then(|rest| rest.strip_prefix('.'));
    if let Some(resolved) = stripped.and_then(|rest| walk(mapping, rest)) {
        return Ok(resolved);
    }
    Err(EngineError::UnknownPath(path.to_string()))
}

/// Resolve `path` and require that it names a nested field.
pub fn resolve_nested(mapping: &Mapping, path: &str) -> Result<ResolvedPath, EngineError> {
    let resolved = resolve(mapping, path)?;
    if !resolved.is_nested {
        return Err(EngineError::NotNested(path.to_string()));
    }
    Ok(resolved)
}

fn walk(mapping: &Mapping, path: &str) -> Option<ResolvedPath> {
    if path.is_empty() {
        return None;
    }
    let mut node: &SchemaNode = mapping.root();
    let mut depth = 0;
    for segment in path.split('.') {
        node = node.child(segment)?;
        depth += usize::from(node.is_nested);
    }
    Some(ResolvedPath {
        type_name: mapping.type_name().to_string(),
        path: path.to_string(),
        is_nested: node.is_nested,
        depth,
    })
}
