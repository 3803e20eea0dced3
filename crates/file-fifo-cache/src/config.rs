use std::env;
use std::path::PathBuf;

/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: usize = 10;

/// Directory used by `from_env` when `CACHE_DIR` is unset
pub const DEFAULT_CACHE_DIR: &str = "./.cache/gutendex";

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding `index.json` and the entry files
    pub directory: PathBuf,
    /// Maximum number of live entries, at least 1
    pub capacity: usize,
    /// Emit diagnostic trace lines for hits, misses, writes and evictions
    pub verbose: bool,
}

impl CacheConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            capacity: DEFAULT_CAPACITY,
            verbose: false,
        }
    }

    /// Set the capacity; zero is clamped to 1
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let directory = env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR));

        let capacity = env::var("CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_CAPACITY);

        let verbose = env::var("DEBUG")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self::new(directory)
            .with_capacity(capacity)
            .with_verbose(verbose)
    }
}

/// `1` or `true`, case-insensitive
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
