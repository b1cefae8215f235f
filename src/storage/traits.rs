//! Storage trait definitions

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Keys under which the popup's local state is persisted.
///
/// Each blob is JSON-encoded and owned by exactly one component.
pub mod keys {
    /// Tag-count cache blob (map plus `lastWrittenAt`)
    pub const TAG_COUNTS: &str = "tagCounts";
    /// Recent-tag ledger blob
    pub const RECENT_TAGS: &str = "recentTags";
    /// Credential blob
    pub const CREDENTIALS: &str = "credentials";
}

/// Trait for local key-value storage backends
///
/// Values are opaque strings; callers own the encoding. There is no
/// cross-process locking: read-modify-write sequences assume a single
/// writer.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`, returning whether it was present
    fn remove(&self, key: &str) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: KeyValueStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
