//! Redis-backed store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

use crate::KvStore;

/// Store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store capacity exceeded writing '{key}': {needed} bytes needed, {capacity} available")]
    CapacityExceeded {
        key: String,
        needed: usize,
        capacity: usize,
    },

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl StoreError {
    /// True when the backend refused a write because it is full.
    ///
    /// Redis reports this as an `OOM` error once `maxmemory` is reached.
    pub fn is_capacity(&self) -> bool {
        match self {
            Self::CapacityExceeded { .. } => true,
            Self::Connection(e) => e.code() == Some("OOM"),
            _ => false,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Redis store. `ConnectionManager` multiplexes internally and is cheap to
/// clone, so every operation works on its own clone.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

/// Connect to Redis.
///
/// Example URL: `redis://127.0.0.1:6379`
pub async fn init_store(redis_url: &str) -> StoreResult<RedisStore> {
    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    debug!(url = redis_url, "Connected to Redis");
    Ok(RedisStore::new(manager))
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
