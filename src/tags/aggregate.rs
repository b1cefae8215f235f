//! Suggestion aggregation
//!
//! Merges the recent, service-ranked and LLM groups into one display
//! list. Priority is fixed: recent, then service, then LLM.

use super::{SuggestionItem, TagCountsMap};
use std::collections::HashSet;

/// Merge the three suggestion groups, excluding `selected` tags.
///
/// Exclusion and cross-group dedup are case-insensitive; the first
/// spelling emitted wins. A separator joins successive non-empty groups.
/// Separators already inside `service` survive only where they still
/// divide two tags.
pub fn aggregate<R, L, S>(
    recent: &[R],
    service: &[SuggestionItem],
    llm: &[L],
    selected: &[S],
) -> Vec<SuggestionItem>
where
    R: AsRef<str>,
    L: AsRef<str>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = selected.iter().map(|t| t.as_ref().to_lowercase()).collect();

    let groups: [Vec<SuggestionItem>; 3] = [
        recent.iter().map(|t| SuggestionItem::Tag(t.as_ref().to_string())).collect(),
        service.to_vec(),
        llm.iter().map(|t| SuggestionItem::Tag(t.as_ref().to_string())).collect(),
    ];

    let mut merged = Vec::new();
    for group in groups {
        let kept: Vec<SuggestionItem> = group
            .into_iter()
            .filter(|item| match item {
                SuggestionItem::Tag(t) => seen.insert(t.to_lowercase()),
                SuggestionItem::Separator => true,
            })
            .collect();
        let kept = collapse_separators(kept);
        if kept.is_empty() {
            continue;
        }
        if !merged.is_empty() {
            merged.push(SuggestionItem::Separator);
        }
        merged.extend(kept);
    }
    merged
}

/// Drop leading, trailing and repeated separators.
fn collapse_separators(items: Vec<SuggestionItem>) -> Vec<SuggestionItem> {
    let mut out: Vec<SuggestionItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.is_separator() && out.last().map_or(true, SuggestionItem::is_separator) {
            continue;
        }
        out.push(item);
    }
    if out.last().is_some_and(SuggestionItem::is_separator) {
        out.pop();
    }
    out
}

/// Choose the recent group to show.
///
/// With an LLM credential and a completed relevance pass, the filtered
/// list replaces the raw one.
pub fn select_recent<'a>(
    raw: &'a [String],
    relevant: Option<&'a [String]>,
    has_llm_credential: bool,
) -> &'a [String] {
    match relevant {
        Some(filtered) if has_llm_credential => filtered,
        _ => raw,
    }
}

/// Menu label for a tag, weighted by the user's count when known.
pub fn menu_label(tag: &str, counts: &TagCountsMap) -> String {
    let count = counts.get(tag).copied().or_else(|| {
        counts
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(tag))
            .map(|(_, v)| *v)
    });
    match count {
        Some(n) => format!("{} ({})", tag, n),
        None => tag.to_string(),
    }
}
