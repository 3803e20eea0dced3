//! Error types for the FIFO cache
//!
//! These never reach callers of `read`/`write`; they describe why a lookup
//! degraded to a miss or why a write was skipped.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CacheError {
    /// A filesystem operation failed
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// The value could not be encoded as JSON
    Serialize(serde_json::Error),
    /// Stored bytes were not valid JSON for the requested shape
    Deserialize(serde_json::Error),
}

impl CacheError {
    /// Build a mapper for `map_err` that tags an I/O error with the operation and path
    pub(crate) fn io(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> CacheError {
        let path = path.to_path_buf();
        move |source| CacheError::Io { op, path, source }
    }

    /// True when the underlying I/O error says the file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io { op, path, source } => {
                write!(f, "Cache IO error ({} {}): {}", op, path.display(), source)
            }
            CacheError::Serialize(err) => write!(f, "Cache serialize error: {}", err),
            CacheError::Deserialize(err) => write!(f, "Cache deserialize error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io { source, .. } => Some(source),
            CacheError::Serialize(err) | CacheError::Deserialize(err) => Some(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
