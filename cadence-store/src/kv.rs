//! Key-value store trait and the in-memory backend.
//!
//! The sync layer never touches ambient storage directly; every consumer
//! receives a store object implementing this interface so it can be swapped
//! for a test double.

use async_trait::async_trait;
use cadence_core::StoreError;
use std::collections::HashMap;
use std::sync::RwLock;

/// Pluggable persistent key-value store. All values are JSON text.
///
/// Implementations must be safe for concurrent use; the cooperative
/// scheduler guarantees single-writer-at-a-time per key, but reads may
/// interleave freely.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Read {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Write {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Delete {
            key: key.to_string(),
            reason: "lock poisoned".to_string(),
        })?;
        entries.remove(key);
        Ok(())
    }
}
