//! Secret store trait definition.

use crate::error::StoreResult;
use async_trait::async_trait;

/// Key/value storage for per-session CSRF secrets.
///
/// Values are the text-encoded secrets; keys are session identifiers.
/// Implementations must treat an entry whose TTL has elapsed exactly like
/// a missing entry.
///
/// There is no compare-and-swap: two concurrent writers for the same key
/// both succeed and the last write wins.
///
/// # Examples
///
/// ```
/// use csrf_plus_store::{MemoryStore, SecretStore};
///
/// # async fn example() -> csrf_plus_store::StoreResult<()> {
/// let store = MemoryStore::new();
///
/// store.set("session-1", "c2VjcmV0".to_string(), 3600).await?;
/// assert_eq!(store.get("session-1").await?.as_deref(), Some("c2VjcmV0"));
///
/// store.del("session-1").await?;
/// assert!(store.get("session-1").await?.is_none());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is missing or its TTL has elapsed.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Arguments
    ///
    /// * `key` - The session key
    /// * `value` - The encoded secret
    /// * `ttl_seconds` - Lifetime of the entry; `0` means no expiry
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> StoreResult<()>;

    /// Delete the value stored under `key`. Deleting a missing key is not an error.
    async fn del(&self, key: &str) -> StoreResult<()>;

    /// Get store type name for debugging
    fn store_type(&self) -> &'static str;
}
