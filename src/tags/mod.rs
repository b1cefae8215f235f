//! Tag sources and suggestion shaping
//!
//! - `cache`: TTL-backed tag→count vocabulary with scheduled refresh
//! - `ledger`: TTL-backed log of recently saved tags
//! - `filter`: normalize/dedup/denoise/rank pipeline for service suggestions
//! - `aggregate`: merge of recent, service and LLM groups for display

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod ledger;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use aggregate::{aggregate, menu_label, select_recent};
pub use cache::{plan_refresh, LocalTagCache, TagCacheRefresher};
pub use filter::{
    filter_rank, normalize_tags, rank_user_tags_higher, remove_common_tags,
    remove_spurious_results, COMMON_TAGS, NOISE_TAGS,
};
pub use ledger::{RecentTagLedger, TagEntry};

/// The user's tag vocabulary: case-preserved tag → usage count.
pub type TagCountsMap = HashMap<String, u64>;

/// Rendered form of [`SuggestionItem::Separator`].
pub const SEPARATOR: &str = "$separator";

/// One entry of a display suggestion list.
///
/// Separators mark grouping boundaries and are never real tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionItem {
    Tag(String),
    Separator,
}

impl SuggestionItem {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Tag(t) => Some(t),
            Self::Separator => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tag(t) => t,
            Self::Separator => SEPARATOR,
        }
    }
}

impl std::fmt::Display for SuggestionItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for SuggestionItem {
    fn from(s: &str) -> Self {
        if s == SEPARATOR {
            Self::Separator
        } else {
            Self::Tag(s.to_string())
        }
    }
}

/// Render a suggestion list with separators as [`SEPARATOR`].
pub fn display_strings(items: &[SuggestionItem]) -> Vec<String> {
    items.iter().map(|i| i.as_str().to_string()).collect()
}
