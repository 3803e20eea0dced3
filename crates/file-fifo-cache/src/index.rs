//! Insertion-order index of live keys

use crate::error::{CacheError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Ordered set of live keys; position 0 is the oldest and is evicted first.
///
/// Serialized as `{"order": [...]}`. Unknown fields in a stored index are
/// ignored, a missing `order` field reads as empty and non-string elements
/// are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIndex {
    #[serde(default, deserialize_with = "string_keys")]
    order: Vec<String>,
}

/// Keep the string elements of `order`, skipping anything else
fn string_keys<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(key) => Some(key),
            _ => None,
        })
        .collect())
}

impl CacheIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored index, collapsing duplicate keys onto their first position
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let index: CacheIndex = serde_json::from_slice(bytes).map_err(CacheError::Deserialize)?;
        Ok(index.deduplicated())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(CacheError::Serialize)
    }

    /// Keys in insertion order, oldest first
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }

    /// Append `key` unless it is already present. Returns whether it was appended.
    ///
    /// An existing key keeps its position: this is FIFO by first write, not LRU.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.order.push(key.to_string());
        true
    }

    /// Drop the oldest keys other than `keep` until at most `capacity` remain,
    /// returning them oldest first
    pub fn evict_overflow(&mut self, capacity: usize, keep: &str) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.order.len() > capacity {
            match self.order.iter().position(|k| k != keep) {
                Some(oldest) => evicted.push(self.order.remove(oldest)),
                None => break,
            }
        }
        evicted
    }

    fn deduplicated(self) -> Self {
        let mut seen = HashSet::with_capacity(self.order.len());
        let order = self
            .order
            .into_iter()
            .filter(|key| seen.insert(key.clone()))
            .collect();
        Self { order }
    }
}

impl<S: Into<String>> FromIterator<S> for CacheIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = CacheIndex::new();
        for key in iter {
            let key: String = key.into();
            index.insert(&key);
        }
        index
    }
}
