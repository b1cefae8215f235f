//! Tunables for the suggestion subsystem

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing configuration shared by the caches and the fetch coordinator.
///
/// Durations deserialize from milliseconds so a host can embed this in
/// its own settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Quiet period before an edited URL is considered settled
    #[serde(with = "millis")]
    pub debounce: Duration,
    /// Age after which the cached tag-count map is refreshed
    #[serde(with = "millis")]
    pub tag_cache_ttl: Duration,
    /// Age after which a recent-tag entry expires
    #[serde(with = "millis")]
    pub recent_ttl: Duration,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            tag_cache_ttl: Duration::from_secs(10),
            recent_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl SuggestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_tag_cache_ttl(mut self, ttl: Duration) -> Self {
        self.tag_cache_ttl = ttl;
        self
    }

    pub fn with_recent_ttl(mut self, ttl: Duration) -> Self {
        self.recent_ttl = ttl;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
