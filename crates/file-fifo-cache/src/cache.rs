//! File-based FIFO cache of JSON values

use crate::config::CacheConfig;
use crate::digest::entry_file_name;
use crate::error::{CacheError, Result};
use crate::index::CacheIndex;
use crate::storage::{CacheStorage, FsStorage};
use crate::types::{CacheStats, Lookup, WriteReport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A fixed-capacity cache evicting the earliest-inserted key first.
///
/// `read` and `write` never fail. Writes within one instance are serialized
/// so concurrent callers cannot drop each other's index updates; separate
/// processes sharing a directory are not coordinated.
pub struct FileFifoCache<S = FsStorage> {
    config: CacheConfig,
    storage: S,
    /// Held across the entry write and the index load/modify/store
    write_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    skipped_writes: AtomicU64,
    evictions: AtomicU64,
}

impl FileFifoCache<FsStorage> {
    /// Create a cache backed by `config.directory`.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(config: CacheConfig) -> Self {
        let storage = FsStorage::new(config.directory.clone());
        Self::with_storage(config, storage)
    }
}

impl<S: CacheStorage> FileFifoCache<S> {
    pub fn with_storage(config: CacheConfig, storage: S) -> Self {
        let config = CacheConfig {
            capacity: config.capacity.max(1),
            ..config
        };
        Self {
            config,
            storage,
            write_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            skipped_writes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Configured storage directory, for diagnostics
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get a cached value, `None` on a miss or on any storage or parse failure
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).await.into_option()
    }

    /// Like [`read`](Self::read), returning the outcome as a [`Lookup`]
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let outcome: Lookup<T> = match self.storage.read_entry(&entry_file_name(key)).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Lookup::Hit(value),
                Err(e) => {
                    if self.config.verbose {
                        warn!(key = %key, error = %e, "Cache entry unreadable, treating as miss");
                    }
                    Lookup::Miss
                }
            },
            Ok(None) => Lookup::Miss,
            Err(e) => {
                if self.config.verbose {
                    warn!(key = %key, error = %e, "Cache read error, treating as miss");
                }
                Lookup::Miss
            }
        };

        if outcome.is_hit() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if self.config.verbose {
                debug!(key = %key, "Cache hit");
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            if self.config.verbose {
                debug!(key = %key, "Cache miss");
            }
        }

        outcome
    }

    /// Store a value. Failures are logged (when verbose) and otherwise ignored.
    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_write(key, value).await {
            self.skipped_writes.fetch_add(1, Ordering::Relaxed);
            if self.config.verbose {
                warn!(key = %key, error = %e, "Cache write skipped");
            }
        }
    }

    /// Store a value, reporting why the write was skipped.
    ///
    /// Writes the entry, then appends the key to the index unless it is already
    /// live, evicts the oldest other keys beyond capacity, saves the index and
    /// finally deletes the evicted entries. A failed eviction delete does not
    /// fail the write.
    pub async fn try_write<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<WriteReport> {
        let bytes = serde_json::to_vec(value).map_err(CacheError::Serialize)?;

        let _guard = self.write_lock.lock().await;

        self.storage.prepare().await?;
        self.storage
            .write_entry(&entry_file_name(key), &bytes)
            .await?;

        let mut index = self.load_index().await;
        let appended = index.insert(key);
        let evicted = index.evict_overflow(self.config.capacity, key);

        if let Err(e) = self.storage.save_index(&index).await {
            // The stored index is unchanged, so a newly added entry would be an orphan
            if appended {
                let _ = self.storage.remove_entry(&entry_file_name(key)).await;
            }
            return Err(e);
        }

        // Only delete once the index no longer lists the evicted keys
        for old_key in &evicted {
            self.remove_evicted(old_key).await;
        }

        self.writes.fetch_add(1, Ordering::Relaxed);
        self.evictions
            .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        if self.config.verbose {
            debug!(key = %key, appended, size = bytes.len(), "Cache write");
        }

        Ok(WriteReport { appended, evicted })
    }

    /// Return the cached value for `key`, or fetch, cache and return it.
    ///
    /// A fetch error is returned as-is and nothing is cached.
    pub async fn get_or_insert_with<T, E, F, Fut>(
        &self,
        key: &str,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Lookup::Hit(value) = self.lookup(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        self.write(key, &value).await;
        Ok(value)
    }

    /// Live keys, oldest first
    pub async fn keys(&self) -> Vec<String> {
        self.load_index().await.order().to_vec()
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.load_index().await.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            skipped_writes: self.skipped_writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Load the index, treating a corrupt or unreadable one as empty
    async fn load_index(&self) -> CacheIndex {
        match self.storage.load_index().await {
            Ok(index) => index,
            Err(e) => {
                if self.config.verbose {
                    warn!(error = %e, "Cache index unreadable, starting empty");
                }
                CacheIndex::new()
            }
        }
    }

    async fn remove_evicted(&self, key: &str) {
        match self.storage.remove_entry(&entry_file_name(key)).await {
            Ok(()) => {
                if self.config.verbose {
                    debug!(key = %key, "Cache evict");
                }
            }
            // Already gone; the index drop is what matters
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                if self.config.verbose {
                    warn!(key = %key, error = %e, "Failed to delete evicted entry");
                }
            }
        }
    }
}
