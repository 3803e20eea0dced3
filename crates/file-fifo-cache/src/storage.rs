//! Storage backends for entry files and the index

use crate::error::{CacheError, Result};
use crate::index::CacheIndex;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Name of the index file inside the cache directory
pub const INDEX_FILE: &str = "index.json";

/// Suffix appended to a target path while it is being written
const TMP_SUFFIX: &str = ".tmp";

/// Where entries and the index live.
///
/// Entry names come from [`crate::entry_file_name`]. Writes must be atomic:
/// a reader sees either the previous content or the new content.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Make sure the backing location exists
    async fn prepare(&self) -> Result<()>;

    /// Read an entry, `Ok(None)` when it does not exist
    async fn read_entry(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replace an entry atomically
    async fn write_entry(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Delete an entry; a missing entry is reported as a not-found error
    async fn remove_entry(&self, name: &str) -> Result<()>;

    /// Load the index; a missing index is an empty one, a corrupt one is an error
    async fn load_index(&self) -> Result<CacheIndex>;

    /// Replace the index atomically
    async fn save_index(&self, index: &CacheIndex) -> Result<()>;
}

/// Directory-backed storage: `<dir>/index.json` plus one `<digest>.json` per entry
#[derive(Debug, Clone)]
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Write to `<path>.tmp`, sync, then rename over `path`
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = tmp_path(path);

        if let Err(e) = write_synced(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CacheError::io("rename", path)(e));
        }

        Ok(())
    }
}

#[async_trait]
impl CacheStorage for FsStorage {
    async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(CacheError::io("create_dir", &self.dir))
    }

    async fn read_entry(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io("read", &path)(e)),
        }
    }

    async fn write_entry(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.write_atomic(&self.entry_path(name), bytes).await
    }

    async fn remove_entry(&self, name: &str) -> Result<()> {
        let path = self.entry_path(name);
        fs::remove_file(&path)
            .await
            .map_err(CacheError::io("remove", &path))
    }

    async fn load_index(&self) -> Result<CacheIndex> {
        let path = self.index_path();
        match fs::read(&path).await {
            Ok(bytes) => CacheIndex::from_json(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CacheIndex::new()),
            Err(e) => Err(CacheError::io("read", &path)(e)),
        }
    }

    async fn save_index(&self, index: &CacheIndex) -> Result<()> {
        let bytes = index.to_json()?;
        self.write_atomic(&self.index_path(), &bytes).await
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .map_err(CacheError::io("create", path))?;
    file.write_all(bytes)
        .await
        .map_err(CacheError::io("write", path))?;
    file.sync_all().await.map_err(CacheError::io("sync", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("/cache/abc.json")),
            PathBuf::from("/cache/abc.json.tmp")
        );
        assert_eq!(
            tmp_path(Path::new("/cache/index.json")),
            PathBuf::from("/cache/index.json.tmp")
        );
    }

    #[tokio::test]
    async fn test_read_missing_entry_is_none() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().join("never-created"));
        assert!(storage.read_entry("abc.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_entry_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.prepare().await.unwrap();

        storage.write_entry("abc.json", b"{\"v\":1}").await.unwrap();
        storage.write_entry("abc.json", b"{\"v\":2}").await.unwrap();

        let bytes = storage.read_entry("abc.json").await.unwrap().unwrap();
        assert_eq!(bytes, b"{\"v\":2}");
        assert!(!dir.path().join("abc.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_without_directory_fails() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().join("missing"));
        let err = storage.write_entry("abc.json", b"{}").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_missing_entry_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let err = storage.remove_entry("gone.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_index_round_trip_and_missing_index() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage.prepare().await.unwrap();

        assert!(storage.load_index().await.unwrap().is_empty());

        let index: CacheIndex = ["a", "b"].into_iter().collect();
        storage.save_index(&index).await.unwrap();
        assert_eq!(storage.load_index().await.unwrap(), index);

        let raw = std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
        assert_eq!(raw, r#"{"order":["a","b"]}"#);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "{\"order\":[\"a\"").unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(matches!(
            storage.load_index().await,
            Err(CacheError::Deserialize(_))
        ));
    }
}
