//! Error types for secret store operations.

use thiserror::Error;

/// Result type for secret store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Secret store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis-specific error
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Backend failure reported by a custom store
    #[error("Secret store backend error: {0}")]
    Backend(String),

    /// Configuration error
    #[error("Secret store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a new backend error
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StoreError::backend("connection reset");
        assert_eq!(
            error.to_string(),
            "Secret store backend error: connection reset"
        );

        let error = StoreError::config("empty prefix");
        assert!(error.to_string().contains("empty prefix"));
    }
}
