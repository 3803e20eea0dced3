//! Key to filename mapping

use sha2::{Digest, Sha256};

/// Extension given to every entry file
pub const ENTRY_EXTENSION: &str = "json";

/// Hex-encoded SHA-256 digest of a cache key
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Filename of the entry holding `key`, e.g. `<64 hex chars>.json`
pub fn entry_file_name(key: &str) -> String {
    format!("{}.{}", key_digest(key), ENTRY_EXTENSION)
}
