//! In-process store, used by tests and the `memory` backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{StoreError, StoreResult};
use crate::KvStore;

/// HashMap-backed store with an optional byte capacity.
///
/// Usage is counted as the sum of key and value lengths. A write that would
/// push usage over the capacity fails with [`StoreError::CapacityExceeded`]
/// and leaves the previous value in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    capacity: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Mutex::new(Some(bytes)),
        }
    }

    /// Change (or lift) the capacity limit.
    pub fn set_capacity(&self, bytes: Option<usize>) {
        *lock(&self.capacity) = bytes;
    }

    /// Bytes currently held.
    pub fn used_bytes(&self) -> usize {
        lock(&self.entries)
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = lock(&self.entries);
        if let Some(capacity) = *lock(&self.capacity) {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            if others + needed > capacity {
                return Err(StoreError::CapacityExceeded {
                    key: key.to_string(),
                    needed,
                    capacity: capacity.saturating_sub(others),
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        store.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_capacity_rejects_oversized_write() {
        let store = MemoryStore::with_capacity(10);
        store.set("k", "12345").await.unwrap();

        let err = store.set("j", "123456789").await.unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(store.get("j").await.unwrap(), None);

        // Overwriting an existing key only counts the replacement.
        store.set("k", "123456789").await.unwrap();
        assert_eq!(store.used_bytes(), 10);
    }
}
