//! Redis secret store
//!
//! Uses Redis key expiry for TTLs, so no sweep is needed.
//! Requires the `redis` feature to be enabled.

use crate::error::{StoreError, StoreResult};
use crate::traits::SecretStore;
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, trace};

/// Default key prefix for stored secrets
pub const DEFAULT_PREFIX: &str = "csrf-plus";

/// Redis-backed secret store
///
/// Shares secrets across multiple application instances.
///
/// # Examples
///
/// ```no_run
/// use csrf_plus_store::{RedisStore, SecretStore};
///
/// #[tokio::main]
/// async fn main() -> csrf_plus_store::StoreResult<()> {
///     let store = RedisStore::with_prefix("redis://localhost:6379", "myapp:csrf").await?;
///     store.set("session-1", "c2VjcmV0".to_string(), 3600).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Create a new Redis store
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn new(url: &str) -> StoreResult<Self> {
        Self::with_prefix(url, DEFAULT_PREFIX).await
    }

    /// Create a new Redis store with a custom key prefix
    pub async fn with_prefix(url: &str, prefix: impl Into<String>) -> StoreResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(StoreError::config("Redis key prefix must not be empty"));
        }

        debug!(prefix = %prefix, "Connecting to Redis for CSRF secrets");

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn, prefix })
    }

    /// Get the full key with prefix
    fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.prefix, suffix)
    }
}

#[async_trait]
impl SecretStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> StoreResult<()> {
        trace!(ttl_seconds = ttl_seconds, "Storing secret in Redis");

        let mut conn = self.conn.clone();
        let full_key = self.key(key);

        if ttl_seconds == 0 {
            let _: () = conn.set(&full_key, value).await?;
        } else {
            let _: () = conn.set_ex(&full_key, value, ttl_seconds).await?;
        }

        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await?;
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("prefix", &self.prefix)
            .finish()
    }
}
