//! Pinsuggest: tag suggestions for saving Pinboard bookmarks
//!
//! Combines three suggestion sources (the user's recently used tags,
//! the bookmarking service's suggestions, and an LLM) into one ranked
//! list while a bookmark is being edited.
//!
//! # Core Concepts
//!
//! - **Tag cache**: the user's tag vocabulary with counts, refreshed on a TTL
//! - **Recent-tag ledger**: tags used in recent saves, expiring after a TTL
//! - **Filter/rank pipeline**: cleans service suggestions and floats known tags
//! - **Coordinator**: debounces URL edits, runs lookups, drops stale responses,
//!   and sends each LLM context at most once
//!
//! # Example
//!
//! ```
//! use pinsuggest::{filter_rank, display_strings, TagCountsMap};
//!
//! let counts: TagCountsMap = [("Foo".to_string(), 3), ("bar".to_string(), 1)]
//!     .into_iter()
//!     .collect();
//! let ranked = filter_rank(&["baz", "foo", "qux", "bar"], &counts);
//! assert_eq!(display_strings(&ranked), ["foo", "bar", "$separator", "baz", "qux"]);
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod save;
pub mod storage;
pub mod suggest;
pub mod tags;

pub use client::{
    ApiError, BookmarkApi, CredentialStore, Credentials, LlmApi, LlmError, LlmRequest,
    PinboardSuggestions, Post, StoredCredentials,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SuggestConfig;
pub use save::{save_bookmark, SaveError};
pub use storage::{KeyValueStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult};
pub use suggest::{Coordinator, FormData, SuggestState};
pub use tags::{
    aggregate, display_strings, filter_rank, LocalTagCache, RecentTagLedger, SuggestionItem,
    TagCacheRefresher, TagCountsMap, SEPARATOR,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
