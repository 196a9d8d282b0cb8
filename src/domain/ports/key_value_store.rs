//! Key-value storage port.
//!
//! The scan session store persists its whole collection as one serialized
//! value under a single key. Adapters provide that string slot; they know
//! nothing about sessions.

use async_trait::async_trait;
use thiserror::Error;

/// Error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage quota exceeded writing {key}: {size} bytes over limit of {limit}")]
    QuotaExceeded { key: String, size: usize, limit: usize },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// String-valued storage slot, injected into the scan session store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if present
    /// * `Ok(None)` if the key has never been written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
