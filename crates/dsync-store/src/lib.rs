//! dsync persistence layer.
//!
//! Every document dsync keeps (versions, bindings, sync sources, history,
//! integration config) is an opaque JSON string stored under a namespaced
//! key. Backends only implement get/set/remove; typed access goes through
//! [`get_json`] and [`set_json`].

pub mod client;
pub mod keys;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use client::{init_store, RedisStore, StoreError, StoreResult};
pub use keys::{Keys, DEFAULT_NAMESPACE};
pub use memory::MemoryStore;

/// String-keyed document store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the raw document under `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write the raw document under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Read and deserialize the JSON document under `key`.
pub async fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and write it under `key`.
pub async fn set_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> StoreResult<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new();
        let doc = Doc { name: "brand".to_string(), count: 3 };

        set_json(&store, "dsync:doc", &doc).await.unwrap();
        let loaded: Option<Doc> = get_json(&store, "dsync:doc").await.unwrap();
        assert_eq!(loaded, Some(doc));

        let missing: Option<Doc> = get_json(&store, "dsync:other").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_json_rejects_garbage() {
        let store = MemoryStore::new();
        store.set("dsync:doc", "not json").await.unwrap();

        let result: StoreResult<Option<Doc>> = get_json(&store, "dsync:doc").await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
