//! Local tag cache
//!
//! The user's tag vocabulary persisted under [`keys::TAG_COUNTS`] with
//! the time it was written. A refresh replaces the map wholesale; a
//! failed refresh leaves the stored map untouched.

use super::TagCountsMap;
use crate::client::BookmarkApi;
use crate::clock::Clock;
use crate::storage::{keys, KeyValueStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Serialize, Deserialize)]
struct CachedCounts {
    tags: TagCountsMap,
    #[serde(rename = "lastWrittenAt")]
    last_written_at: i64,
}

pub struct LocalTagCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl LocalTagCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// The cached map, or empty when absent or unreadable.
    pub fn read(&self) -> TagCountsMap {
        self.load().map(|c| c.tags).unwrap_or_default()
    }

    /// Replace the cached map and stamp it with the current time.
    pub fn write(&self, tags: &TagCountsMap) -> StorageResult<()> {
        let json = serde_json::to_string(&CachedCounts {
            tags: tags.clone(),
            last_written_at: self.clock.now_millis(),
        })?;
        self.store.set(keys::TAG_COUNTS, &json)
    }

    pub fn last_written_at(&self) -> Option<i64> {
        self.load().map(|c| c.last_written_at)
    }

    /// Whether the cached map is younger than the TTL.
    pub fn is_fresh(&self) -> bool {
        plan_refresh(self.last_written_at(), self.clock.now_millis(), self.ttl) > Duration::ZERO
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn load(&self) -> Option<CachedCounts> {
        let raw = match self.store.get(keys::TAG_COUNTS) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read tag cache");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "discarding unparseable tag cache"))
            .ok()
    }
}

/// Delay before the first refresh.
///
/// Zero when nothing is cached or the cache is stale, otherwise the
/// time remaining until the cached map reaches `ttl`.
pub fn plan_refresh(last_written_at: Option<i64>, now: i64, ttl: Duration) -> Duration {
    let Some(written) = last_written_at else {
        return Duration::ZERO;
    };
    let age = now.saturating_sub(written).max(0) as u128;
    let ttl_ms = ttl.as_millis();
    if age >= ttl_ms {
        Duration::ZERO
    } else {
        Duration::from_millis((ttl_ms - age) as u64)
    }
}

/// Keeps the cached vocabulary current while the popup is open.
///
/// Publishes the map through a watch channel. The refresh loop stops
/// when the refresher is dropped.
pub struct TagCacheRefresher {
    handle: JoinHandle<()>,
    rx: watch::Receiver<TagCountsMap>,
}

impl TagCacheRefresher {
    /// Publish the cached map immediately and start refreshing.
    ///
    /// A fresh cache is refreshed once it reaches the TTL; an absent or
    /// stale one right away. After that, every TTL interval.
    pub fn spawn(cache: Arc<LocalTagCache>, api: Arc<dyn BookmarkApi>) -> Self {
        let (tx, rx) = watch::channel(cache.read());
        let first = plan_refresh(cache.last_written_at(), cache.clock.now_millis(), cache.ttl);
        tracing::debug!(first_refresh_ms = first.as_millis() as u64, "scheduling tag cache refresh");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(first).await;
            loop {
                refresh_once(&cache, api.as_ref(), &tx).await;
                tokio::time::sleep(cache.ttl).await;
            }
        });

        Self { handle, rx }
    }

    /// Receiver tracking the latest vocabulary.
    pub fn subscribe(&self) -> watch::Receiver<TagCountsMap> {
        self.rx.clone()
    }

    pub fn current(&self) -> TagCountsMap {
        self.rx.borrow().clone()
    }
}

impl Drop for TagCacheRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn refresh_once(
    cache: &LocalTagCache,
    api: &dyn BookmarkApi,
    tx: &watch::Sender<TagCountsMap>,
) {
    match api.all_tags().await {
        Ok(tags) => {
            if let Err(e) = cache.write(&tags) {
                tracing::warn!(error = %e, "failed to persist refreshed tags");
            }
            tracing::debug!(count = tags.len(), "tag cache refreshed");
            tx.send_replace(tags);
        }
        Err(e) => tracing::warn!(error = %e, "tag cache refresh failed; keeping cached tags"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, MockBookmarkApi};
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;

    const TTL: Duration = Duration::from_secs(10);

    fn counts(entries: &[(&str, u64)]) -> TagCountsMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn cache_at(clock: &ManualClock) -> (Arc<LocalTagCache>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = LocalTagCache::new(store.clone(), Arc::new(clock.clone()), TTL);
        (Arc::new(cache), store)
    }

    #[test]
    fn plan_refresh_cases() {
        assert_eq!(plan_refresh(None, 50_000, TTL), Duration::ZERO);
        assert_eq!(plan_refresh(Some(46_000), 50_000, TTL), Duration::from_secs(6));
        assert_eq!(plan_refresh(Some(40_000), 50_000, TTL), Duration::ZERO);
        assert_eq!(plan_refresh(Some(10_000), 50_000, TTL), Duration::ZERO);
    }

    #[test]
    fn write_then_read() {
        let clock = ManualClock::new(1_000);
        let (cache, _) = cache_at(&clock);
        assert!(cache.read().is_empty());
        assert!(!cache.is_fresh());

        cache.write(&counts(&[("Rust", 3)])).unwrap();
        assert_eq!(cache.read(), counts(&[("Rust", 3)]));
        assert_eq!(cache.last_written_at(), Some(1_000));
        assert!(cache.is_fresh());

        clock.advance(TTL);
        assert!(!cache.is_fresh());
    }

    #[test]
    fn corrupt_blob_reads_empty() {
        let clock = ManualClock::new(0);
        let (cache, store) = cache_at(&clock);
        store.set(keys::TAG_COUNTS, "nope").unwrap();
        assert!(cache.read().is_empty());
        assert_eq!(cache.last_written_at(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_cache_refreshes_immediately_and_repeats() {
        let clock = ManualClock::new(0);
        let (cache, _) = cache_at(&clock);
        let api = Arc::new(MockBookmarkApi::new().with_tags(counts(&[("web", 2)])));

        let refresher = TagCacheRefresher::spawn(cache.clone(), api.clone());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(api.tag_calls(), 1);
        assert_eq!(refresher.current(), counts(&[("web", 2)]));
        assert_eq!(cache.read(), counts(&[("web", 2)]));

        tokio::time::sleep(TTL).await;
        assert_eq!(api.tag_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_cache_used_then_refreshed_at_ttl() {
        let clock = ManualClock::new(100_000);
        let (cache, _) = cache_at(&clock);
        cache.write(&counts(&[("old", 1)])).unwrap();
        clock.advance(Duration::from_secs(4));

        let api = Arc::new(MockBookmarkApi::new().with_tags(counts(&[("new", 1)])));
        let refresher = TagCacheRefresher::spawn(cache.clone(), api.clone());
        assert_eq!(refresher.current(), counts(&[("old", 1)]));

        tokio::time::sleep(Duration::from_millis(5_900)).await;
        assert_eq!(api.tag_calls(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(api.tag_calls(), 1);
        assert_eq!(refresher.current(), counts(&[("new", 1)]));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_cached_map() {
        let clock = ManualClock::new(0);
        let (cache, _) = cache_at(&clock);
        cache.write(&counts(&[("keep", 7)])).unwrap();
        clock.advance(Duration::from_secs(60));

        let api = Arc::new(MockBookmarkApi::new());
        api.set_tags(Err(ApiError::Status(503)));
        let refresher = TagCacheRefresher::spawn(cache.clone(), api.clone());
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(api.tag_calls(), 1);
        assert_eq!(cache.read(), counts(&[("keep", 7)]));
        assert_eq!(refresher.current(), counts(&[("keep", 7)]));

        api.set_tags(Ok(counts(&[("fresh", 1)])));
        tokio::time::sleep(TTL).await;
        assert_eq!(refresher.current(), counts(&[("fresh", 1)]));
    }
}
