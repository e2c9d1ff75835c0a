//! Session storage trait and an in-memory implementation.
//!
//! Mirrors browser local storage: string keys mapping to string values.

use aichat_types::error::StorageError;
use dashmap::DashMap;

/// Trait for the key/value store backing the client session.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// The file-backed implementation lives in aichat-infra.
pub trait SessionStorage: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Remove a key. No-op if the key does not exist.
    fn remove(&self, key: &str)
    -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// Process-local session storage. Contents vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: DashMap<String, String>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl<T: SessionStorage> SessionStorage for &T {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key).await
    }
}
