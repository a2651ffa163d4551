use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Errors that can occur with key-value store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// String key-value storage backing client-side persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value`, overwriting anything at `key`
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Redis-backed store, shared across devices of the same deployment
pub struct RedisStore {
    // Store ConnectionManager in a Mutex for interior mutability
    redis: Arc<Mutex<ConnectionManager>>,
}

impl RedisStore {
    pub async fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Arc::new(Mutex::new(redis)),
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Store get {}: {}", key, if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.redis.lock().await;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Store set: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.lock().await;
        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }
}
