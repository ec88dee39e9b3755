// csrf-plus - Cross-site request forgery protection for Rust web services
//
// Masked synchronizer tokens backed by a pluggable secret store, or
// stateless HMAC-signed tokens that need no storage at all.

// Re-export the engine
pub use csrf_plus_core::*;

// Re-export member crates
pub use csrf_plus_core;
pub use csrf_plus_store;

// Re-export stores
pub use csrf_plus_store::{MemoryStore, SecretStore, StoreError, StoreResult};

#[cfg(feature = "redis")]
pub use csrf_plus_store::RedisStore;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CookieSink,
        CsrfConfig,
        CsrfConfigBuilder,
        CsrfError,
        CsrfMiddleware,
        CsrfOptions,
        CsrfRequest,
        IssuedToken,
        MemoryStore,
        Rejection,
        RequestInfo,
        SameSite,
        SecretStore,
        VerifyError,
    };

    #[cfg(feature = "redis")]
    pub use crate::RedisStore;
}
