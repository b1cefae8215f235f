//! Local key-value storage
//!
//! Popup state lives outside process memory as namespaced JSON blobs
//! behind the `KeyValueStore` trait. `SqliteStore` is the persistent
//! backend; `MemoryStore` keeps everything in process.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{keys, KeyValueStore, OpenStore, StorageError, StorageResult};
