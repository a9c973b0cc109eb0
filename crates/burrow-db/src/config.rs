use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Interval in milliseconds between background refreshes. `None`
    /// leaves refreshing to the caller.
    pub refresh_interval_ms: Option<u64>,
    /// Refresh after every index and delete call.
    pub refresh_on_write: bool,
    /// Deepest chain of nested fields a mapping may declare.
    pub max_nested_depth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: None,
            refresh_on_write: false,
            max_nested_depth: 16,
        }
    }
}

impl IndexConfig {
    pub(crate) fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
