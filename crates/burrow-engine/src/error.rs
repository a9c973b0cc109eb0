use std::fmt;

use burrow_store::StoreError;

use crate::document::Ordinal;

#[derive(Debug)]
pub enum EngineError {
    Store(StoreError),
    Encoding(bson::error::Error),
    /// The nested path does not resolve against the type's mapping.
    UnknownPath(String),
    /// The path resolves, but the field is not declared `nested`.
    NotNested(String),
    /// A nested-declared field holds something other than objects.
    SchemaMismatch { path: String, found: String },
    /// A block was observed without its root, or with a child that maps to
    /// no parent. Indicates a corrupt segment.
    PartialBlock { ordinal: Ordinal, reason: String },
    InvalidMapping(String),
    InvalidQuery(String),
    InvalidDocument(String),
}

impl EngineError {
    /// Errors raised while compiling a query against the mapping, as
    /// opposed to failures of the storage or the segment itself.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPath(_) | Self::NotNested(_) | Self::InvalidQuery(_)
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Encoding(e) => write!(f, "encoding error: {e}"),
            Self::UnknownPath(path) => write!(f, "[nested] failed to find nested object under path [{path}]"),
            Self::NotNested(path) => write!(f, "[nested] nested object under path [{path}] is not of nested type"),
            Self::SchemaMismatch { path, found } => write!(
                f,
                "object mapping for [{path}] expected an object or an array of objects, found {found}"
            ),
            Self::PartialBlock { ordinal, reason } => {
                write!(f, "partial block at ordinal {ordinal}: {reason}")
            }
            Self::InvalidMapping(msg) => write!(f, "invalid mapping: {msg}"),
            Self::InvalidQuery(msg) => write!(f, "invalid query: {msg}"),
            Self::InvalidDocument(msg) => write!(f, "invalid document: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Encoding(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<bson::error::Error> for EngineError {
    fn from(e: bson::error::Error) -> Self {
        Self::Encoding(e)
    }
}
