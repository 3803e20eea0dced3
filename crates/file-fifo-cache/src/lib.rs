//! File-based JSON response cache with FIFO eviction
//!
//! Stores one JSON file per cached key, named by the SHA-256 digest of the key,
//! plus an `index.json` that records insertion order. Once the number of live
//! keys exceeds the configured capacity, the earliest-inserted keys are evicted.
//! Re-writing a key refreshes its content but keeps its position.
//!
//! The public `read`/`write` calls never fail: any storage or parse problem
//! degrades to a miss or a skipped write, so callers can always fall back to
//! fetching from the upstream API.
//!
//! # Example
//!
//! ```no_run
//! use file_fifo_cache::{CacheConfig, FileFifoCache};
//! use serde_json::json;
//!
//! # async fn example() {
//! let cache = FileFifoCache::new(CacheConfig::new(".cache/gutendex").with_capacity(10));
//!
//! let url = "https://gutendex.com/books?search=dickens";
//! if cache.read::<serde_json::Value>(url).await.is_none() {
//!     cache.write(url, &json!({ "count": 1, "results": [] })).await;
//! }
//! # }
//! ```

mod cache;
mod config;
mod digest;
mod error;
mod index;
mod memory;
mod storage;
mod types;

pub use cache::FileFifoCache;
pub use config::CacheConfig;
pub use digest::{entry_file_name, key_digest};
pub use error::{CacheError, Result};
pub use index::CacheIndex;
pub use memory::MemoryStorage;
pub use storage::{CacheStorage, FsStorage, INDEX_FILE};
pub use types::{CacheStats, Lookup, WriteReport};
