//! Key-value store trait and the JSON file backend

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::StorageResult;

/// Async string key-value store
///
/// Implementations must treat `remove` of a missing key as success.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace a value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete a value (idempotent).
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Key-value store persisted as a single JSON object on disk
///
/// Every write replaces the file atomically: the new contents go to a
/// sibling temp file which is then renamed over the original, so a crash
/// mid-write leaves either the old or the new map, never a torn file.
/// Operations are serialized through an async mutex.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Store backed by the file at `path`. The file and its parent
    /// directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> StorageResult<BTreeMap<String, String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(err) => {
                // An unreadable store would otherwise block logout forever.
                warn!(path = %self.path.display(), error = %err, "Discarding corrupt key-value file");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let serialized = serde_json::to_vec_pretty(map)?;
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, serialized).await?;
        restrict_permissions(&tmp_path).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = %self.path.display(), entries = map.len(), "Key-value file written");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().await;
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map).await
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> StorageResult<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> StorageResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> FileKeyValueStore {
        FileKeyValueStore::new(dir.path().join("nested").join("storage.json"))
    }

    #[tokio::test]
    async fn set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.get("accessToken").await.unwrap(), None);

        store.set("accessToken", "a1").await.unwrap();
        store.set("refreshToken", "r1").await.unwrap();
        assert_eq!(store.get("accessToken").await.unwrap().as_deref(), Some("a1"));

        store.set("accessToken", "a2").await.unwrap();
        assert_eq!(store.get("accessToken").await.unwrap().as_deref(), Some("a2"));

        store.remove("accessToken").await.unwrap();
        assert_eq!(store.get("accessToken").await.unwrap(), None);
        assert_eq!(store.get("refreshToken").await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn remove_missing_key_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.remove("nothing").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        store_in(&dir).set("user", r#"{"id":"1"}"#).await.unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("user").await.unwrap().as_deref(), Some(r#"{"id":"1"}"#));
        assert!(!reopened.tmp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_replaced_on_next_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        tokio::fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(store.path(), "{ not json").await.unwrap();

        assert_eq!(store.get("accessToken").await.unwrap(), None);
        store.set("accessToken", "fresh").await.unwrap();
        assert_eq!(store.get("accessToken").await.unwrap().as_deref(), Some("fresh"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set("accessToken", "a").await.unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
