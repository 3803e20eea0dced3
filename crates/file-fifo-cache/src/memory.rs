//! In-memory storage backend
//!
//! Keeps entries and the serialized index in process memory so FIFO behaviour
//! can be exercised without touching disk. Unit tests in this crate can also
//! tamper with the stored bytes and switch faults on to drive the
//! skipped-write paths.

use crate::error::{CacheError, Result};
use crate::index::CacheIndex;
use crate::storage::{CacheStorage, INDEX_FILE};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, Vec<u8>>,
    /// Raw index bytes, so corrupt indexes can be simulated
    index: Option<Vec<u8>>,
    fail_entry_writes: bool,
    fail_index_saves: bool,
    fail_removes: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Names of the stored entries, sorted
    pub fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains_entry(&self, name: &str) -> bool {
        self.state().entries.contains_key(name)
    }

    /// Store raw bytes under an entry name, bypassing the cache
    #[cfg(test)]
    pub(crate) fn put_raw_entry(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.state().entries.insert(name.to_string(), bytes.into());
    }

    #[cfg(test)]
    pub(crate) fn remove_raw_entry(&self, name: &str) {
        self.state().entries.remove(name);
    }

    /// Replace the stored index bytes verbatim
    #[cfg(test)]
    pub(crate) fn set_raw_index(&self, bytes: impl Into<Vec<u8>>) {
        self.state().index = Some(bytes.into());
    }

    #[cfg(test)]
    pub(crate) fn raw_index(&self) -> Option<Vec<u8>> {
        self.state().index.clone()
    }

    #[cfg(test)]
    pub(crate) fn delete_index(&self) {
        self.state().index = None;
    }

    #[cfg(test)]
    pub(crate) fn fail_entry_writes(&self, fail: bool) {
        self.state().fail_entry_writes = fail;
    }

    #[cfg(test)]
    pub(crate) fn fail_index_saves(&self, fail: bool) {
        self.state().fail_index_saves = fail;
    }

    #[cfg(test)]
    pub(crate) fn fail_removes(&self, fail: bool) {
        self.state().fail_removes = fail;
    }
}

fn simulated(op: &'static str, name: &str, kind: io::ErrorKind) -> CacheError {
    CacheError::io(op, Path::new(name))(io::Error::new(kind, "simulated storage failure"))
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    async fn read_entry(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.state().entries.get(name).cloned())
    }

    async fn write_entry(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut state = self.state();
        if state.fail_entry_writes {
            return Err(simulated("write", name, io::ErrorKind::Other));
        }
        state.entries.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove_entry(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_removes {
            return Err(simulated("remove", name, io::ErrorKind::PermissionDenied));
        }
        match state.entries.remove(name) {
            Some(_) => Ok(()),
            None => Err(simulated("remove", name, io::ErrorKind::NotFound)),
        }
    }

    async fn load_index(&self) -> Result<CacheIndex> {
        match self.state().index.as_deref() {
            Some(bytes) => CacheIndex::from_json(bytes),
            None => Ok(CacheIndex::new()),
        }
    }

    async fn save_index(&self, index: &CacheIndex) -> Result<()> {
        let bytes = index.to_json()?;
        let mut state = self.state();
        if state.fail_index_saves {
            return Err(simulated("write", INDEX_FILE, io::ErrorKind::Other));
        }
        state.index = Some(bytes);
        Ok(())
    }
}
