//! Secret storage for csrf-plus.
//!
//! Stateful CSRF protection keeps one random secret per session on the
//! server. This crate defines the [`SecretStore`] contract the verification
//! engine talks to, plus two backends:
//!
//! - **Memory**: [`MemoryStore`], a DashMap with lazy expiry and an optional
//!   periodic sweep (single instance, tests)
//! - **Redis**: [`RedisStore`], distributed storage using native key expiry
//!   (requires the `redis` feature)
//!
//! Stores are constructed explicitly and injected into the engine
//! configuration; there is no process-wide default store.
//!
//! # Examples
//!
//! ```
//! use csrf_plus_store::{MemoryStore, SecretStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> csrf_plus_store::StoreResult<()> {
//! let store: Arc<dyn SecretStore> = Arc::new(MemoryStore::new());
//!
//! store.set("session-1", "encoded-secret".to_string(), 3600).await?;
//! let secret = store.get("session-1").await?;
//! assert_eq!(secret.as_deref(), Some("encoded-secret"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::SecretStore;

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
