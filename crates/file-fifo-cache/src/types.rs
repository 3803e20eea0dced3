//! Cache types

use serde::{Deserialize, Serialize};

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
        }
    }
}

/// What a successful write did to the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// False when the key was already live and only its content was replaced
    pub appended: bool,
    /// Keys evicted by this write, oldest first
    pub evicted: Vec<String>,
}

/// Statistics about the cache
///
/// Counters are per process; `entries` is read from the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub skipped_writes: u64,
    pub evictions: u64,
}
