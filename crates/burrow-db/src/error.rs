use std::fmt;

use burrow_engine::EngineError;
use burrow_store::StoreError;

#[derive(Debug)]
pub enum DbError {
    Engine(EngineError),
    Store(StoreError),
    TypeNotFound(String),
    /// A type was registered again with a different mapping.
    MappingConflict(String),
    InvalidId(String),
}

impl DbError {
    /// True when the query itself is at fault (unknown or non-nested path,
    /// malformed clause), as opposed to the index.
    pub fn is_query_error(&self) -> bool {
        match self {
            DbError::Engine(e) => e.is_query_error(),
            DbError::TypeNotFound(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Engine(e) => write!(f, "{e}"),
            DbError::Store(e) => write!(f, "store error: {e}"),
            DbError::TypeNotFound(name) => write!(f, "type not found: {name}"),
            DbError::MappingConflict(name) => {
                write!(f, "mapping for type [{name}] conflicts with the registered one")
            }
            DbError::InvalidId(msg) => write!(f, "invalid id: {msg}"),
        }
    }
}

impl std::error::Error for DbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DbError::Engine(e) => Some(e),
            DbError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for DbError {
    fn from(e: EngineError) -> Self {
        DbError::Engine(e)
    }
}

impl From<StoreError> for DbError {
    fn from(e: StoreError) -> Self {
        DbError::Store(e)
    }
}

impl From<bson::error::Error> for DbError {
    fn from(e: bson::error::Error) -> Self {
        DbError::Engine(EngineError::Encoding(e))
    }
}
