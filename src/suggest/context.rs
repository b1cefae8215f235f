//! LLM context keys
//!
//! The inputs that should gate an LLM call are serialized into a
//! [`ContextKey`]. [`ContextKeyCache`] remembers the last dispatched key
//! and the outcome of every key seen, so a context is never sent twice.

use crate::client::{LlmError, LlmRequest};
use std::collections::HashMap;

/// Inputs relevant to an LLM suggestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionContext {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Tags as first read for the current URL session
    pub existing_tags: Vec<String>,
}

impl SuggestionContext {
    /// Deterministic serialization; equal keys mean equivalent contexts.
    pub fn key(&self) -> ContextKey {
        let value = serde_json::json!([
            self.url,
            self.title,
            self.description,
            self.existing_tags,
        ]);
        ContextKey(value.to_string())
    }

    pub fn to_request(&self) -> LlmRequest {
        LlmRequest {
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            existing_tags: self.existing_tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What is known about the LLM call for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutcome {
    InFlight,
    Fulfilled(Vec<String>),
    Failed(LlmError),
}

/// Result of presenting a freshly computed key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyDecision {
    /// Same as the last dispatched key: nothing to do
    Unchanged,
    /// Seen before: reuse its outcome without a new call
    Reuse(LlmOutcome),
    /// Never seen: the caller must dispatch the call
    Dispatch,
}

/// Per-session memo of LLM calls by context key.
///
/// Entries are never evicted: the cache lives as long as one popup
/// session and holds one entry per distinct context the user produced.
#[derive(Debug, Clone, Default)]
pub struct ContextKeyCache {
    last: Option<ContextKey>,
    outcomes: HashMap<ContextKey, LlmOutcome>,
    relevant: HashMap<ContextKey, Vec<String>>,
}

impl ContextKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as the most recently dispatched and decide what to do.
    pub fn decide(&mut self, key: ContextKey) -> KeyDecision {
        if self.last.as_ref() == Some(&key) {
            return KeyDecision::Unchanged;
        }
        let decision = match self.outcomes.get(&key) {
            Some(outcome) => KeyDecision::Reuse(outcome.clone()),
            None => {
                self.outcomes.insert(key.clone(), LlmOutcome::InFlight);
                KeyDecision::Dispatch
            }
        };
        self.last = Some(key);
        decision
    }

    /// Store the outcome for `key`. Returns whether `key` is still current.
    pub fn settle(&mut self, key: &ContextKey, outcome: LlmOutcome) -> bool {
        self.outcomes.insert(key.clone(), outcome);
        self.is_current(key)
    }

    /// Drop a call that never started so `key` can be dispatched again.
    pub fn abandon(&mut self, key: &ContextKey) {
        if self.outcomes.get(key) == Some(&LlmOutcome::InFlight) {
            self.outcomes.remove(key);
        }
        if self.is_current(key) {
            self.last = None;
        }
    }

    /// Store the relevance-filtered recent tags computed for `key`.
    pub fn set_relevant(&mut self, key: ContextKey, tags: Vec<String>) {
        self.relevant.insert(key, tags);
    }

    /// Relevance-filtered recent tags for the current key, if known.
    pub fn current_relevant(&self) -> Option<&[String]> {
        self.last
            .as_ref()
            .and_then(|key| self.relevant.get(key))
            .map(Vec::as_slice)
    }

    /// Forget which key is current; known outcomes are kept.
    pub fn clear_current(&mut self) {
        self.last = None;
    }

    pub fn is_current(&self, key: &ContextKey) -> bool {
        self.last.as_ref() == Some(key)
    }

    pub fn last(&self) -> Option<&ContextKey> {
        self.last.as_ref()
    }

    /// Number of distinct keys ever dispatched.
    pub fn dispatched(&self) -> usize {
        self.outcomes.len()
    }
}
