use crate::config::StoreSettings;
use crate::models::UserProfile;
use crate::services::kv::{KeyValueStore, MemoryStore, RedisStore, StoreError};
use std::sync::Arc;

/// Key builder for client-side persisted entries
pub struct StoreKey;

impl StoreKey {
    /// Raw Google credential of the signed-in user
    pub fn google_token() -> &'static str {
        "google_token"
    }

    /// Serialized `UserProfile`
    pub fn user(email: &str) -> String {
        format!("user_{}", email)
    }

    /// Answers of the optional side quiz
    ///
    /// Reserved: the side quiz is not part of this crate, but its key is kept
    /// so nothing else is written under the same name.
    pub fn side_quiz(email: &str) -> String {
        format!("lala_{}", email)
    }
}

/// Reads and writes whole user profiles keyed by email
///
/// `save` overwrites the stored profile; callers build partial updates as
/// read-modify-write.
#[derive(Clone)]
pub struct PersistenceClient {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceClient {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Client over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Redis when a URL is configured, otherwise in-memory
    pub async fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        match settings.redis_url.as_deref() {
            Some(url) => {
                tracing::info!("Using Redis profile store");
                Ok(Self::new(Arc::new(RedisStore::new(url).await?)))
            }
            None => {
                tracing::info!("No Redis URL configured, using in-memory profile store");
                Ok(Self::in_memory())
            }
        }
    }

    pub async fn load(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        let key = StoreKey::user(email);
        match self.store.get(&key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => {
                tracing::debug!("No stored profile for {}", email);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)?;
        self.store.set(&StoreKey::user(&profile.email), json).await?;
        tracing::debug!("Saved profile for {}", profile.email);
        Ok(())
    }

    pub async fn remove(&self, email: &str) -> Result<(), StoreError> {
        self.store.remove(&StoreKey::user(email)).await
    }

    pub async fn load_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(StoreKey::google_token()).await
    }

    pub async fn save_token(&self, credential: &str) -> Result<(), StoreError> {
        self.store
            .set(StoreKey::google_token(), credential.to_string())
            .await
    }

    pub async fn clear_token(&self) -> Result<(), StoreError> {
        self.store.remove(StoreKey::google_token()).await
    }
}
