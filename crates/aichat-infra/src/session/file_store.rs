//! JSON-file implementation of [`SessionStorage`].
//!
//! All keys live in one flat JSON object at `{data_dir}/session.json`,
//! the terminal equivalent of the browser's local storage. Writes go to a
//! temporary file that is then renamed over the original.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use aichat_core::session::SessionStorage;
use aichat_types::error::StorageError;

/// File name inside the data directory.
pub const SESSION_FILE: &str = "session.json";

pub struct FileSessionStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Storage at `{data_dir}/session.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self::at(data_dir.join(SESSION_FILE))
    }

    /// Storage at an explicit file path.
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session file is corrupt, starting empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| {
                    StorageError::Io(format!("failed to create {}: {e}", parent.display()))
                })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::Io(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| {
                StorageError::Io(format!("failed to replace {}: {e}", self.path.display()))
            })
    }
}

impl SessionStorage for FileSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.save(&map).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use aichat_core::session::SessionGate;
    use aichat_core::session::gate::{AUTH_KEY, DEMO_EMAIL, DEMO_PASSWORD, PROFILE_KEY};

    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(tmp.path());
        assert_eq!(storage.get("anything").await.unwrap(), None);
        // Removing from a missing file does not create it.
        storage.remove("anything").await.unwrap();
        assert!(!storage.path().exists());
    }

    #[tokio::test]
    async fn test_set_creates_data_dir() {
        let tmp = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(&tmp.path().join("nested").join("dir"));
        storage.set("k", "v").await.unwrap();

        let raw = tokio::fs::read_to_string(storage.path()).await.unwrap();
        let map: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(map.get("k").map(String::as_str), Some("v"));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty_and_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(tmp.path());
        tokio::fs::write(storage.path(), "{oops").await.unwrap();

        assert_eq!(storage.get("k").await.unwrap(), None);
        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_session_survives_new_storage_instance() {
        let tmp = TempDir::new().unwrap();
        {
            let mut gate = SessionGate::new(FileSessionStorage::new(tmp.path()));
            gate.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        }

        let storage = FileSessionStorage::new(tmp.path());
        assert_eq!(storage.get(AUTH_KEY).await.unwrap().as_deref(), Some("true"));
        assert!(storage.get(PROFILE_KEY).await.unwrap().is_some());

        let mut gate = SessionGate::new(storage);
        let profile = gate.restore().await.unwrap().cloned().unwrap();
        assert_eq!(profile.email, DEMO_EMAIL);
    }
}
