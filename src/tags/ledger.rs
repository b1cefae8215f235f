//! Recent-tag ledger
//!
//! An append log of individually timestamped tag usages persisted under
//! [`keys::RECENT_TAGS`]. Entries expire after the TTL; uniqueness is
//! applied only when listing, most recent timestamp winning.

use crate::clock::Clock;
use crate::storage::{keys, KeyValueStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// A single recorded use of a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub tag: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

pub struct RecentTagLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
}

impl RecentTagLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl_millis: ttl.as_millis() as i64,
        }
    }

    /// Append one entry per tag, newest first, after purging expired ones.
    pub fn record<S: AsRef<str>>(&self, tags: &[S]) -> StorageResult<()> {
        let now = self.clock.now_millis();
        let existing = self.purge(self.load(), now);

        let mut entries: Vec<TagEntry> = tags
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(|t| TagEntry {
                tag: t.to_string(),
                timestamp: now,
            })
            .collect();
        tracing::debug!(recorded = entries.len(), retained = existing.len(), "recording recent tags");
        entries.extend(existing);
        self.save(&entries)
    }

    /// Unexpired tags, deduplicated, most recently used first.
    ///
    /// Persists the purge when anything expired. Storage failures degrade
    /// to an empty list.
    pub fn list(&self) -> Vec<String> {
        let now = self.clock.now_millis();
        let loaded = self.load();
        let before = loaded.len();
        let mut entries = self.purge(loaded, now);

        if entries.len() != before {
            if let Err(e) = self.save(&entries) {
                tracing::warn!(error = %e, "failed to persist recent-tag purge");
            }
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|e| seen.insert(e.tag.clone()))
            .map(|e| e.tag)
            .collect()
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove(keys::RECENT_TAGS).map(|_| ())
    }

    /// Raw entries as persisted, malformed records dropped.
    pub fn entries(&self) -> Vec<TagEntry> {
        self.load()
    }

    fn purge(&self, entries: Vec<TagEntry>, now: i64) -> Vec<TagEntry> {
        entries
            .into_iter()
            .filter(|e| now - e.timestamp <= self.ttl_millis)
            .collect()
    }

    fn load(&self) -> Vec<TagEntry> {
        match self.store.get(keys::RECENT_TAGS) {
            Ok(Some(raw)) => parse_entries(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read recent tags");
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[TagEntry]) -> StorageResult<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(keys::RECENT_TAGS, &json)
    }
}

/// Parse a persisted ledger, keeping only well-formed records.
fn parse_entries(raw: &str) -> Vec<TagEntry> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unparseable recent-tag ledger");
            return Vec::new();
        }
    };
    let Some(records) = value.as_array() else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|record| {
            let tag = record.get("tag")?.as_str()?;
            let ts = record.get("timestamp")?;
            let timestamp = ts.as_i64().or_else(|| ts.as_f64().map(|f| f as i64))?;
            Some(TagEntry {
                tag: tag.to_string(),
                timestamp,
            })
        })
        .collect()
}
