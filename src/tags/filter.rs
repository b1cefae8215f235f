//! Suggestion filter/rank pipeline
//!
//! Applied to the service's raw suggestions in a fixed order:
//! normalize → dedup → spurious-result collapse → common-tag removal →
//! user-tag ranking. Every step is pure.

use super::{SuggestionItem, TagCountsMap};
use std::collections::HashSet;

/// The service's fallback answer when it knows nothing about a page.
///
/// If a response contains all of these it carries no information.
/// Matching is all-or-nothing, so a change in the upstream fallback
/// silently disables the collapse.
pub const NOISE_TAGS: [&str; 10] = [
    "ifttt",
    "twitter",
    "facebook",
    "wsh",
    "objective-c",
    "twitterlink",
    "instapaper",
    "iphone",
    "youtube",
    "via:packrati.us",
];

/// Generic and import-artifact tags that never make useful suggestions.
pub const COMMON_TAGS: &[&str] = &[
    "ifttt",
    "twitter",
    "facebook",
    "wsh",
    "twitterlink",
    "instapaper",
    "pocket",
    "feedly",
    "readitlater",
    "readlater",
    "unread",
    "toread",
    "no_tag",
    "imported",
    "twitter-import",
    "delicious",
];

const VIA_PREFIX: &str = "via:";

/// Trim, lowercase, drop empties, then dedup preserving first occurrence.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Collapse to empty iff `tags` contains every member of [`NOISE_TAGS`].
pub fn remove_spurious_results(tags: Vec<String>) -> Vec<String> {
    let present: HashSet<&str> = tags.iter().map(String::as_str).collect();
    if NOISE_TAGS.iter().all(|noise| present.contains(noise)) {
        tracing::debug!(count = tags.len(), "discarding fallback suggestion set");
        Vec::new()
    } else {
        tags
    }
}

/// Drop [`COMMON_TAGS`] members and anything prefixed `via:` (any case).
pub fn remove_common_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .filter(|t| {
            let lower = t.to_lowercase();
            !lower.starts_with(VIA_PREFIX) && !COMMON_TAGS.contains(&lower.as_str())
        })
        .collect()
}

/// Float tags the user already uses to the front.
///
/// Membership is a case-insensitive key match against `counts`. Each
/// partition keeps its relative order; a single separator sits between
/// them only when both are non-empty.
pub fn rank_user_tags_higher(tags: Vec<String>, counts: &TagCountsMap) -> Vec<SuggestionItem> {
    let known_keys: HashSet<String> = counts.keys().map(|k| k.to_lowercase()).collect();
    let (known, other): (Vec<String>, Vec<String>) = tags
        .into_iter()
        .partition(|t| known_keys.contains(&t.to_lowercase()));

    let mut ranked: Vec<SuggestionItem> = known.into_iter().map(SuggestionItem::Tag).collect();
    if !ranked.is_empty() && !other.is_empty() {
        ranked.push(SuggestionItem::Separator);
    }
    ranked.extend(other.into_iter().map(SuggestionItem::Tag));
    ranked
}

/// Run the whole pipeline over a raw suggestion list.
///
/// With no input or an empty vocabulary only normalization applies.
pub fn filter_rank<S: AsRef<str>>(raw: &[S], counts: &TagCountsMap) -> Vec<SuggestionItem> {
    let tags = normalize_tags(raw);
    if tags.is_empty() || counts.is_empty() {
        return tags.into_iter().map(SuggestionItem::Tag).collect();
    }
    let tags = remove_spurious_results(tags);
    let tags = remove_common_tags(tags);
    rank_user_tags_higher(tags, counts)
}
