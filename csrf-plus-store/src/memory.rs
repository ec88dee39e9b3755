//! In-memory secret store
//!
//! Uses DashMap for thread-safe concurrent access. Suitable for single-instance
//! deployments or testing. For distributed deployments, use the Redis store.
//!
//! Expiry is evaluated lazily on read. An optional periodic sweep reclaims
//! memory held by entries nobody reads again.

use crate::error::{StoreError, StoreResult};
use crate::traits::SecretStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Stored secret with its optional deadline
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl_seconds: u64, now: Instant) -> Self {
        let expires_at = if ttl_seconds == 0 {
            None
        } else {
            now.checked_add(Duration::from_secs(ttl_seconds))
        };
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

/// In-memory secret store
///
/// Every instance owns its own map; nothing is shared between stores.
///
/// # Examples
///
/// ```
/// use csrf_plus_store::{MemoryStore, SecretStore};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> csrf_plus_store::StoreResult<()> {
///     let store = MemoryStore::with_sweep(Duration::from_secs(60))?;
///     store.set("sid", "value".to_string(), 30).await?;
///     store.shutdown();
///     Ok(())
/// }
/// ```
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryStore {
    /// Create a new in-memory store with lazy expiry only
    pub fn new() -> Self {
        debug!("Creating new in-memory secret store");
        Self {
            entries: Arc::new(DashMap::new()),
            sweeper: Mutex::new(None),
        }
    }

    /// Create a store that also purges expired entries every `interval`.
    ///
    /// Must be called from within a Tokio runtime. The sweep runs as a single
    /// background task until [`MemoryStore::shutdown`] is called or the store
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `interval` is zero or no runtime is available.
    pub fn with_sweep(interval: Duration) -> StoreResult<Self> {
        if interval.is_zero() {
            return Err(StoreError::config("Sweep interval must be non-zero"));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StoreError::config(format!("No Tokio runtime for sweep task: {}", e)))?;

        let store = Self::new();
        let entries = Arc::clone(&store.entries);

        debug!(interval = ?interval, "Starting in-memory secret store sweep");

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = purge(&entries);
                if removed > 0 {
                    debug!(removed = removed, "Swept expired secrets");
                }
            }
        });

        if let Ok(mut sweeper) = store.sweeper.lock() {
            *sweeper = Some(handle);
        }

        Ok(store)
    }

    /// Remove every expired entry now. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }

    /// Number of entries currently held, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a background sweep task is running
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .map(|sweeper| sweeper.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Stop the background sweep, if any. Safe to call more than once.
    ///
    /// The store stays usable afterwards; expiry falls back to lazy
    /// evaluation on read.
    pub fn shutdown(&self) {
        let handle = match self.sweeper.lock() {
            Ok(mut sweeper) => sweeper.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(handle) = handle {
            debug!("Stopping in-memory secret store sweep");
            handle.abort();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.len())
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}

fn purge(entries: &DashMap<String, Entry>) -> usize {
    let now = Instant::now();
    let mut removed = 0;
    entries.retain(|_, entry| {
        let keep = !entry.is_expired(now);
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            // Re-check under the shard lock so a concurrent fresh `set` survives
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
            trace!("Dropped expired secret on read");
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> StoreResult<()> {
        trace!(ttl_seconds = ttl_seconds, "Storing secret");
        self.entries
            .insert(key.to_string(), Entry::new(value, ttl_seconds, Instant::now()));
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let store = MemoryStore::new();

        store.set("a", "one".to_string(), 60).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("one"));

        store.del("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_last_write_wins() {
        let store = MemoryStore::new();

        store.set("a", "one".to_string(), 60).await.unwrap();
        store.set("a", "two".to_string(), 60).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_on_read() {
        let store = MemoryStore::new();
        store.set("a", "one".to_string(), 1).await.unwrap();

        tokio::time::advance(Duration::from_millis(900)).await;
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("one"));

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(store.get("a").await.unwrap().is_none());

        // The expired entry is removed by the read
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_never_expires() {
        let store = MemoryStore::new();
        store.set("a", "one".to_string(), 0).await.unwrap();

        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("one"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_after_expiry_is_visible() {
        let store = MemoryStore::new();
        store.set("a", "old".to_string(), 1).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        store.set("a", "new".to_string(), 1).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.set("short", "x".to_string(), 1).await.unwrap();
        store.set("long", "y".to_string(), 60).await.unwrap();
        store.set("forever", "z".to_string(), 0).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweep() {
        let store = MemoryStore::with_sweep(Duration::from_secs(10)).unwrap();
        assert!(store.is_sweeping());

        store.set("a", "one".to_string(), 1).await.unwrap();
        assert_eq!(store.len(), 1);

        // Let the sweep tick without anyone reading the key
        tokio::time::sleep(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;

        assert!(store.is_empty());
        store.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let store = MemoryStore::with_sweep(Duration::from_secs(1)).unwrap();
        store.shutdown();
        store.shutdown();
        tokio::task::yield_now().await;
        assert!(!store.is_sweeping());

        // Still usable after shutdown
        store.set("a", "one".to_string(), 60).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("one"));
    }

    #[test]
    fn test_sweep_requires_runtime() {
        assert!(MemoryStore::with_sweep(Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_zero_sweep_interval_rejected() {
        assert!(matches!(
            MemoryStore::with_sweep(Duration::ZERO),
            Err(StoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_stores_are_independent() {
        let first = MemoryStore::new();
        let second = MemoryStore::new();

        first.set("a", "one".to_string(), 60).await.unwrap();
        assert!(second.get("a").await.unwrap().is_none());
    }

    #[test]
    fn test_store_type() {
        let store = MemoryStore::new();
        assert_eq!(store.store_type(), "memory");
    }
}
