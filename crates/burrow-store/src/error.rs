use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    TransactionConsumed,
    ReadOnly,
    ColumnFamilyNotFound(String),
    /// A lock guarding store or index state was poisoned by a panicking
    /// holder.
    Poisoned(&'static str),
    /// A stored value does not have the layout its key implies.
    Corrupt { cf: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::TransactionConsumed => write!(f, "transaction already committed or rolled back"),
            StoreError::ReadOnly => write!(f, "write attempted in a read-only transaction"),
            StoreError::ColumnFamilyNotFound(name) => write!(f, "column family not found: {name}"),
            StoreError::Poisoned(what) => write!(f, "{what} lock poisoned"),
            StoreError::Corrupt { cf, reason } => write!(f, "corrupt entry in [{cf}]: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}
