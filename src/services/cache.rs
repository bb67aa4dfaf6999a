use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{PreferenceModel, UserId};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Multi-tier cache manager
///
/// Implements L1 (in-memory) and L2 (Redis) caching strategy.
/// L1 is fastest but local to one instance, L2 is shared across instances.
/// Only the discovery read path consults it; mutations invalidate after commit.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Cached preference model, `None` on a miss in both tiers
    pub async fn get_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<PreferenceModel>, CacheError> {
        let key = CacheKey::preferences(user_id);
        match self.fetch(&key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set_preferences(&self, model: &PreferenceModel) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(model)?;
        self.store(CacheKey::preferences(model.user_id), bytes).await
    }

    /// Drop a user's model from both tiers
    pub async fn invalidate_preferences(&self, user_id: UserId) -> Result<(), CacheError> {
        let key = CacheKey::preferences(user_id);
        self.l1_cache.invalidate(&key).await;

        let mut conn = self.redis.lock().await;
        redis::cmd("DEL")
            .arg(&key)
            .query_async::<()>(&mut *conn)
            .await?;
        Ok(())
    }

    /// Number of entries currently held in L1
    pub fn l1_entries(&self) -> u64 {
        self.l1_cache.entry_count()
    }

    /// L1 first; an L2 hit is copied into L1
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(Some(bytes));
        }

        let bytes: Option<Vec<u8>> = {
            let mut conn = self.redis.lock().await;
            redis::cmd("GET").arg(key).query_async(&mut *conn).await?
        };

        match bytes {
            Some(bytes) => {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), bytes.clone()).await;
                Ok(Some(bytes))
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Ok(None)
            }
        }
    }

    async fn store(&self, key: String, bytes: Vec<u8>) -> Result<(), CacheError> {
        {
            let mut conn = self.redis.lock().await;
            redis::cmd("SET")
                .arg(&key)
                .arg(&bytes)
                .arg("EX")
                .arg(self.ttl_secs)
                .query_async::<()>(&mut *conn)
                .await?;
        }
        self.l1_cache.insert(key, bytes).await;
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user's preference model
    pub fn preferences(user_id: UserId) -> String {
        format!("petch:prefs:{}", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_preferences_roundtrip() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let mut model = PreferenceModel::new(77);
        model.breed_weights.insert("beagle".to_string(), 0.25);

        cache.set_preferences(&model).await.unwrap();
        assert_eq!(cache.get_preferences(77).await.unwrap(), Some(model));

        cache.invalidate_preferences(77).await.unwrap();
        assert_eq!(cache.get_preferences(77).await.unwrap(), None);
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::preferences(123), "petch:prefs:123");
    }
}
