//! Suggestion state machine
//!
//! All popup state lives in one [`SuggestState`] mutated only by
//! [`SuggestState::apply`]. A transition is atomic and returns the
//! [`Effect`]s (network calls) the driver must start. Responses come
//! back as actions carrying the identity of the request that produced
//! them, and anything no longer current is discarded.

use super::context::{ContextKey, ContextKeyCache, KeyDecision, LlmOutcome, SuggestionContext};
use super::target::is_plausible_url;
use crate::client::{LlmError, LlmRequest, PinboardSuggestions, Post};
use crate::tags::{aggregate, filter_rank, normalize_tags, select_recent, SuggestionItem, TagCountsMap};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Opaque identity of one dispatched lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: RequestId,
    pub target_url: String,
    /// Epoch milliseconds
    pub issued_at: i64,
}

/// Lifecycle of one lookup target.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase<T> {
    #[default]
    Idle,
    Pending,
    Fulfilled(T),
    Rejected(String),
}

impl<T> Phase<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Fulfilled or rejected.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Fulfilled(_) | Self::Rejected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fulfilled(v) => Some(v),
            _ => None,
        }
    }
}

/// A lookup target with its request bookkeeping.
///
/// `last_issued` outlives settlement so late responses can still be
/// recognized as stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<T> {
    pub phase: Phase<T>,
    pub last_issued: Option<FetchRequest>,
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            last_issued: None,
        }
    }
}

impl<T> Lookup<T> {
    /// Supersede whatever is outstanding with a new request.
    fn issue(&mut self, target_url: &str, now: i64) -> FetchRequest {
        let request = FetchRequest {
            id: RequestId::new(),
            target_url: target_url.to_string(),
            issued_at: now,
        };
        self.last_issued = Some(request.clone());
        self.phase = Phase::Pending;
        request
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.last_issued.as_ref().is_some_and(|r| r.id == id)
    }

    pub fn is_pending(&self) -> bool {
        self.phase.is_pending()
    }

    pub fn is_settled(&self) -> bool {
        self.phase.is_settled()
    }
}

/// Editable bookmark fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormData {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub private: bool,
    pub toread: bool,
}

/// State transitions. Response variants carry the identity they answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Raw URL text changed; not yet a lookup target
    UrlEdited(String),
    /// The URL has been stable for the quiet period
    UrlSettled(String),
    TitleEdited(String),
    DescriptionEdited(String),
    TagsEdited(Vec<String>),
    PrivateSet(bool),
    ToReadSet(bool),
    DetailsFulfilled {
        request: FetchRequest,
        post: Option<Post>,
    },
    DetailsRejected {
        request: FetchRequest,
        error: String,
    },
    SuggestionsFulfilled {
        request: FetchRequest,
        suggestions: PinboardSuggestions,
    },
    SuggestionsRejected {
        request: FetchRequest,
        error: String,
    },
    LlmFulfilled {
        key: ContextKey,
        tags: Vec<String>,
    },
    LlmRejected {
        key: ContextKey,
        error: LlmError,
    },
    /// The LLM call for `key` was never sent: the credential was gone
    LlmAbandoned {
        key: ContextKey,
    },
    RelevantRecentFulfilled {
        key: ContextKey,
        tags: Vec<String>,
    },
    RelevantRecentRejected {
        key: ContextKey,
        error: LlmError,
    },
    RecentTagsLoaded(Vec<String>),
    TagCountsUpdated(TagCountsMap),
    LlmCredentialChanged(bool),
}

/// Work the driver must start after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchDetails(FetchRequest),
    FetchSuggestions(FetchRequest),
    FetchLlm {
        key: ContextKey,
        request: LlmRequest,
    },
    FilterRecent {
        key: ContextKey,
        request: LlmRequest,
        candidates: Vec<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SuggestState {
    pub form: FormData,
    /// Current lookup target, set once a settled URL passes validation
    pub debounced_url: Option<String>,
    /// True while the bookmark-details lookup for the target is outstanding
    pub initial_loading: bool,
    pub details: Lookup<Option<Post>>,
    pub suggestions: Lookup<PinboardSuggestions>,
    pub llm: Phase<Vec<String>>,
    /// Last LLM failure, kept for diagnostics
    pub llm_error: Option<LlmError>,
    /// Recent-tag ledger contents, most recent first
    pub recent: Vec<String>,
    pub tag_counts: TagCountsMap,
    pub has_llm_credential: bool,
    tag_snapshot: Option<Vec<String>>,
    context_keys: ContextKeyCache,
}

impl SuggestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transition at time `now` (epoch millis).
    pub fn apply(&mut self, action: Action, now: i64) -> Vec<Effect> {
        let mut effects = match action {
            Action::UrlEdited(url) => {
                self.form.url = url;
                Vec::new()
            }
            Action::UrlSettled(url) => self.settle_url(url, now),
            Action::TitleEdited(title) => {
                self.form.title = title;
                Vec::new()
            }
            Action::DescriptionEdited(description) => {
                self.form.description = description;
                Vec::new()
            }
            Action::TagsEdited(tags) => {
                self.form.tags = tags;
                Vec::new()
            }
            Action::PrivateSet(private) => {
                self.form.private = private;
                Vec::new()
            }
            Action::ToReadSet(toread) => {
                self.form.toread = toread;
                Vec::new()
            }
            Action::DetailsFulfilled { request, post } => {
                self.on_details(request, Ok(post));
                Vec::new()
            }
            Action::DetailsRejected { request, error } => {
                self.on_details(request, Err(error));
                Vec::new()
            }
            Action::SuggestionsFulfilled {
                request,
                suggestions,
            } => {
                self.on_suggestions(request, Ok(suggestions));
                Vec::new()
            }
            Action::SuggestionsRejected { request, error } => {
                self.on_suggestions(request, Err(error));
                Vec::new()
            }
            Action::LlmFulfilled { key, tags } => {
                let tags = normalize_tags(&tags);
                if self.context_keys.settle(&key, LlmOutcome::Fulfilled(tags.clone())) {
                    self.llm = Phase::Fulfilled(tags);
                    self.llm_error = None;
                } else {
                    debug!("discarding LLM suggestions for superseded context");
                }
                Vec::new()
            }
            Action::LlmRejected { key, error } => {
                if self.context_keys.settle(&key, LlmOutcome::Failed(error.clone())) {
                    self.llm = Phase::Rejected(error.to_string());
                    self.llm_error = Some(error);
                }
                Vec::new()
            }
            Action::LlmAbandoned { key } => {
                debug!("LLM credential missing at dispatch");
                if self.context_keys.is_current(&key) && self.llm.is_pending() {
                    self.llm = Phase::Idle;
                }
                self.context_keys.abandon(&key);
                self.has_llm_credential = false;
                Vec::new()
            }
            Action::RelevantRecentFulfilled { key, tags } => {
                self.context_keys.set_relevant(key, tags);
                Vec::new()
            }
            Action::RelevantRecentRejected { key, error } => {
                debug!(%error, current = self.context_keys.is_current(&key), "recent-tag relevance pass failed");
                Vec::new()
            }
            Action::RecentTagsLoaded(tags) => {
                self.recent = tags;
                Vec::new()
            }
            Action::TagCountsUpdated(counts) => {
                self.tag_counts = counts;
                Vec::new()
            }
            Action::LlmCredentialChanged(present) => {
                self.has_llm_credential = present;
                Vec::new()
            }
        };
        effects.extend(self.maybe_dispatch_llm());
        effects
    }

    fn settle_url(&mut self, url: String, now: i64) -> Vec<Effect> {
        let url = url.trim().to_string();
        if self.debounced_url.as_deref() == Some(url.as_str()) {
            return Vec::new();
        }
        // New session: the tag snapshot is only ever reset here.
        self.tag_snapshot = None;
        self.llm = Phase::Idle;
        self.llm_error = None;
        self.context_keys.clear_current();

        if !is_plausible_url(&url) {
            debug!(url = %url, "ignoring implausible URL");
            self.debounced_url = None;
            self.initial_loading = false;
            self.details = Lookup::default();
            self.suggestions = Lookup::default();
            return Vec::new();
        }

        let details = self.details.issue(&url, now);
        let suggestions = self.suggestions.issue(&url, now);
        debug!(url = %url, details = %details.id, suggestions = %suggestions.id, "dispatching lookups");
        self.debounced_url = Some(url);
        self.initial_loading = true;
        vec![
            Effect::FetchDetails(details),
            Effect::FetchSuggestions(suggestions),
        ]
    }

    fn on_details(&mut self, request: FetchRequest, result: Result<Option<Post>, String>) {
        if !self.details.is_current(request.id) {
            debug!(url = %request.target_url, id = %request.id, "discarding stale bookmark details");
            if !self.details.is_pending() {
                self.initial_loading = false;
            }
            return;
        }
        self.initial_loading = false;
        match result {
            Ok(post) => {
                if let Some(post) = &post {
                    self.form.title = post.title.clone();
                    self.form.description = post.description.clone();
                    self.form.tags = post.tags.clone();
                    self.form.private = post.private;
                    self.form.toread = post.toread;
                }
                self.details.phase = Phase::Fulfilled(post);
                self.fill_from_preview();
            }
            Err(error) => {
                debug!(url = %request.target_url, %error, "bookmark details lookup failed");
                self.details.phase = Phase::Rejected(error);
            }
        }
    }

    fn on_suggestions(&mut self, request: FetchRequest, result: Result<PinboardSuggestions, String>) {
        if !self.suggestions.is_current(request.id) {
            debug!(url = %request.target_url, id = %request.id, "discarding stale suggestions");
            return;
        }
        match result {
            Ok(suggestions) => {
                self.suggestions.phase = Phase::Fulfilled(suggestions);
                self.fill_from_preview();
            }
            Err(error) => {
                debug!(url = %request.target_url, %error, "suggestion lookup failed");
                self.suggestions.phase = Phase::Rejected(error);
            }
        }
    }

    /// For pages not yet bookmarked, fill blank fields from the page preview.
    fn fill_from_preview(&mut self) {
        let Some(None) = self.details.phase.value() else {
            return;
        };
        let Some(preview) = self.suggestions.phase.value().and_then(|s| s.preview.as_ref()) else {
            return;
        };
        if self.form.title.trim().is_empty() {
            if let Some(title) = &preview.title {
                self.form.title = title.clone();
            }
        }
        if self.form.description.trim().is_empty() {
            if let Some(description) = &preview.description {
                self.form.description = description.clone();
            }
        }
    }

    fn maybe_dispatch_llm(&mut self) -> Vec<Effect> {
        if !self.has_llm_credential || self.initial_loading || self.suggestions.is_pending() {
            return Vec::new();
        }
        let Some(url) = self.debounced_url.clone() else {
            return Vec::new();
        };
        if !(self.details.is_settled() && self.suggestions.is_settled()) {
            return Vec::new();
        }

        let snapshot = self
            .tag_snapshot
            .get_or_insert_with(|| self.form.tags.clone())
            .clone();
        let context = SuggestionContext {
            url,
            title: self.form.title.clone(),
            description: self.form.description.clone(),
            existing_tags: snapshot,
        };
        let key = context.key();

        match self.context_keys.decide(key.clone()) {
            KeyDecision::Unchanged => Vec::new(),
            KeyDecision::Reuse(outcome) => {
                debug!("reusing LLM outcome for known context");
                self.llm = match outcome {
                    LlmOutcome::InFlight => Phase::Pending,
                    LlmOutcome::Fulfilled(tags) => Phase::Fulfilled(tags),
                    LlmOutcome::Failed(error) => {
                        let message = error.to_string();
                        self.llm_error = Some(error);
                        Phase::Rejected(message)
                    }
                };
                Vec::new()
            }
            KeyDecision::Dispatch => {
                debug!(url = %context.url, "dispatching LLM suggestions");
                self.llm = Phase::Pending;
                self.llm_error = None;
                let request = context.to_request();
                let mut effects = Vec::with_capacity(2);
                if !self.recent.is_empty() {
                    effects.push(Effect::FilterRecent {
                        key: key.clone(),
                        request: request.clone(),
                        candidates: self.recent.clone(),
                    });
                }
                effects.push(Effect::FetchLlm { key, request });
                effects
            }
        }
    }

    /// Relevance-filtered recent tags for the current context, if any.
    pub fn relevant_recent(&self) -> Option<&[String]> {
        self.context_keys.current_relevant()
    }

    /// Service suggestions for the current target after filtering and ranking.
    pub fn ranked_service_tags(&self) -> Vec<SuggestionItem> {
        match self.suggestions.phase.value() {
            Some(s) => filter_rank(&s.raw_tags(), &self.tag_counts),
            None => Vec::new(),
        }
    }

    /// The merged display list for the current state.
    pub fn display_suggestions(&self) -> Vec<SuggestionItem> {
        let recent = select_recent(&self.recent, self.relevant_recent(), self.has_llm_credential);
        let llm: &[String] = self.llm.value().map(Vec::as_slice).unwrap_or(&[]);
        aggregate(recent, &self.ranked_service_tags(), llm, &self.form.tags)
    }

    /// Number of distinct LLM contexts dispatched over this state's life.
    pub fn llm_dispatches(&self) -> usize {
        self.context_keys.dispatched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PagePreview;
    use crate::tags::display_strings;

    const URL: &str = "https://example.com/article";
    const OTHER: &str = "https://example.org/other";

    fn settle(state: &mut SuggestState, url: &str) -> (FetchRequest, FetchRequest) {
        let effects = state.apply(Action::UrlSettled(url.to_string()), 0);
        match effects.as_slice() {
            [Effect::FetchDetails(d), Effect::FetchSuggestions(s)] => (d.clone(), s.clone()),
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    fn post(title: &str, tags: &[&str]) -> Post {
        Post {
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn llm_effects(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::FetchLlm { .. }))
            .count()
    }

    fn with_credential() -> SuggestState {
        let mut state = SuggestState::new();
        state.apply(Action::LlmCredentialChanged(true), 0);
        state
    }

    #[test]
    fn settled_url_issues_both_lookups() {
        let mut state = SuggestState::new();
        let (details, suggestions) = settle(&mut state, URL);
        assert_eq!(details.target_url, URL);
        assert_eq!(suggestions.target_url, URL);
        assert_ne!(details.id, suggestions.id);
        assert!(state.initial_loading);
        assert_eq!(state.debounced_url.as_deref(), Some(URL));
    }

    #[test]
    fn implausible_url_resets_session() {
        let mut state = SuggestState::new();
        let (details, _) = settle(&mut state, URL);
        assert!(state.apply(Action::UrlSettled("https://exa".into()), 0).is_empty());
        assert_eq!(state.debounced_url, None);
        assert!(!state.initial_loading);

        state.apply(
            Action::DetailsFulfilled {
                request: details,
                post: Some(post("Old", &[])),
            },
            0,
        );
        assert_eq!(state.form.title, "");
    }

    #[test]
    fn same_url_settling_twice_is_ignored() {
        let mut state = SuggestState::new();
        settle(&mut state, URL);
        assert!(state.apply(Action::UrlSettled(URL.into()), 0).is_empty());
    }

    #[test]
    fn current_details_populate_form() {
        let mut state = SuggestState::new();
        let (details, _) = settle(&mut state, URL);
        state.apply(
            Action::DetailsFulfilled {
                request: details,
                post: Some(post("Saved", &["rust"])),
            },
            0,
        );
        assert!(!state.initial_loading);
        assert_eq!(state.form.title, "Saved");
        assert_eq!(state.form.tags, vec!["rust"]);
    }

    #[test]
    fn stale_details_do_not_touch_form_or_loading() {
        let mut state = SuggestState::new();
        let (old, _) = settle(&mut state, URL);
        let (_new, _) = settle(&mut state, OTHER);

        state.apply(
            Action::DetailsFulfilled {
                request: old,
                post: Some(post("Stale", &["x"])),
            },
            0,
        );
        assert_eq!(state.form.title, "");
        assert!(state.form.tags.is_empty());
        assert!(state.initial_loading, "newer request still pending");
    }

    #[test]
    fn stale_details_clear_loading_once_newer_settled() {
        let mut state = SuggestState::new();
        let (old, _) = settle(&mut state, URL);
        let (new, _) = settle(&mut state, OTHER);

        state.apply(
            Action::DetailsFulfilled {
                request: old.clone(),
                post: Some(post("Old", &["old"])),
            },
            0,
        );
        assert!(state.initial_loading, "newer request still outstanding");
        assert!(state.details.is_pending());
        assert_eq!(state.form, FormData::default());

        state.apply(
            Action::DetailsRejected {
                request: new,
                error: "503".into(),
            },
            0,
        );
        assert!(!state.initial_loading);

        state.apply(
            Action::DetailsRejected {
                request: old,
                error: "timeout".into(),
            },
            0,
        );
        assert!(!state.initial_loading);
        assert!(matches!(state.details.phase, Phase::Rejected(ref e) if e == "503"));
        assert_eq!(state.form, FormData::default());
    }

    #[test]
    fn stale_suggestions_are_dropped() {
        let mut state = SuggestState::new();
        let (_, old) = settle(&mut state, URL);
        settle(&mut state, OTHER);
        state.apply(
            Action::SuggestionsFulfilled {
                request: old,
                suggestions: PinboardSuggestions {
                    popular: vec!["stale".into()],
                    ..Default::default()
                },
            },
            0,
        );
        assert!(state.suggestions.is_pending());
    }

    #[test]
    fn preview_fills_blank_fields_for_new_pages() {
        let mut state = SuggestState::new();
        state.apply(Action::DescriptionEdited("typed".into()), 0);
        let (details, suggestions) = settle(&mut state, URL);
        state.apply(
            Action::SuggestionsFulfilled {
                request: suggestions,
                suggestions: PinboardSuggestions {
                    preview: Some(PagePreview {
                        title: Some("Page Title".into()),
                        description: Some("Preview".into()),
                    }),
                    ..Default::default()
                },
            },
            0,
        );
        assert_eq!(state.form.title, "");
        state.apply(Action::DetailsFulfilled { request: details, post: None }, 0);
        assert_eq!(state.form.title, "Page Title");
        assert_eq!(state.form.description, "typed");
    }

    #[test]
    fn llm_waits_for_both_lookups_and_credential() {
        let mut state = SuggestState::new();
        let (details, suggestions) = settle(&mut state, URL);
        state.apply(Action::DetailsFulfilled { request: details, post: None }, 0);
        let effects = state.apply(
            Action::SuggestionsRejected {
                request: suggestions,
                error: "500".into(),
            },
            0,
        );
        assert_eq!(llm_effects(&effects), 0, "no credential");

        let effects = state.apply(Action::LlmCredentialChanged(true), 0);
        assert_eq!(llm_effects(&effects), 1);
        assert!(state.llm.is_pending());
    }

    #[test]
    fn rejected_lookups_still_allow_llm() {
        let mut state = with_credential();
        let (details, suggestions) = settle(&mut state, URL);
        let effects = state.apply(
            Action::DetailsRejected {
                request: details,
                error: "boom".into(),
            },
            0,
        );
        assert_eq!(llm_effects(&effects), 0);
        let effects = state.apply(
            Action::SuggestionsRejected {
                request: suggestions,
                error: "boom".into(),
            },
            0,
        );
        assert_eq!(llm_effects(&effects), 1);
    }

    #[test]
    fn tag_edits_after_dispatch_do_not_redispatch() {
        let mut state = with_credential();
        let (details, suggestions) = settle(&mut state, URL);
        state.apply(
            Action::DetailsFulfilled {
                request: details,
                post: Some(post("T", &["a"])),
            },
            0,
        );
        let effects = state.apply(
            Action::SuggestionsFulfilled {
                request: suggestions,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        );
        assert_eq!(llm_effects(&effects), 1);

        let effects = state.apply(Action::TagsEdited(vec!["a".into(), "b".into()]), 0);
        assert_eq!(llm_effects(&effects), 0);
        let effects = state.apply(Action::TagsEdited(vec![]), 0);
        assert_eq!(llm_effects(&effects), 0);
        assert_eq!(state.llm_dispatches(), 1);
    }

    #[test]
    fn new_url_session_refreshes_tag_snapshot() {
        let mut state = with_credential();
        let (d, s) = settle(&mut state, URL);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        );
        state.apply(Action::TagsEdited(vec!["edited".into()]), 0);

        let (d, s) = settle(&mut state, OTHER);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        let effects = state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        );
        match effects.as_slice() {
            [Effect::FetchLlm { request, .. }] => {
                assert_eq!(request.url, OTHER);
                assert_eq!(request.existing_tags, vec!["edited"]);
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn stale_llm_response_is_cached_but_not_shown() {
        let mut state = with_credential();
        let (d, s) = settle(&mut state, URL);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        let effects = state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        );
        let Some(Effect::FetchLlm { key: first_key, .. }) = effects.last().cloned() else {
            panic!("expected LLM dispatch");
        };

        let effects = state.apply(Action::TitleEdited("New title".into()), 0);
        assert_eq!(llm_effects(&effects), 1);

        state.apply(
            Action::LlmFulfilled {
                key: first_key,
                tags: vec!["Old".into()],
            },
            0,
        );
        assert!(state.llm.is_pending());
    }

    #[test]
    fn llm_failure_is_recorded_and_not_retried() {
        let mut state = with_credential();
        let (d, s) = settle(&mut state, URL);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        let effects = state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        );
        let Some(Effect::FetchLlm { key, .. }) = effects.last().cloned() else {
            panic!("expected LLM dispatch");
        };
        let effects = state.apply(
            Action::LlmRejected {
                key,
                error: LlmError::RateLimit,
            },
            0,
        );
        assert!(effects.is_empty());
        assert_eq!(state.llm_error, Some(LlmError::RateLimit));
        assert!(state.llm.value().is_none());
    }

    #[test]
    fn recent_tags_trigger_relevance_pass() {
        let mut state = with_credential();
        state.apply(Action::RecentTagsLoaded(vec!["recent".into()]), 0);
        let (d, s) = settle(&mut state, URL);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        let effects = state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        );
        let Some(Effect::FilterRecent { key, candidates, .. }) = effects.first().cloned() else {
            panic!("expected relevance pass");
        };
        assert_eq!(candidates, vec!["recent"]);
        assert_eq!(display_strings(&state.display_suggestions()), vec!["recent"]);

        state.apply(Action::RelevantRecentFulfilled { key, tags: vec![] }, 0);
        assert!(state.display_suggestions().is_empty());
    }

    #[test]
    fn display_merges_all_sources() {
        let mut state = with_credential();
        state.apply(Action::RecentTagsLoaded(vec!["a".into()]), 0);
        state.apply(
            Action::TagCountsUpdated([("b".to_string(), 2)].into_iter().collect()),
            0,
        );
        let (d, s) = settle(&mut state, URL);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        let effects = state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions {
                    popular: vec!["B".into()],
                    recommended: vec!["a".into()],
                    preview: None,
                },
            },
            0,
        );
        let Some(Effect::FetchLlm { key, .. }) = effects.last().cloned() else {
            panic!("expected LLM dispatch");
        };
        state.apply(
            Action::LlmFulfilled {
                key,
                tags: vec!["C".into(), "b".into()],
            },
            0,
        );
        assert_eq!(
            display_strings(&state.display_suggestions()),
            vec!["a", "$separator", "b", "$separator", "c"]
        );
    }

    fn ready_with_llm(state: &mut SuggestState, url: &str) -> Vec<Effect> {
        let (d, s) = settle(state, url);
        state.apply(Action::DetailsFulfilled { request: d, post: None }, 0);
        state.apply(
            Action::SuggestionsFulfilled {
                request: s,
                suggestions: PinboardSuggestions::default(),
            },
            0,
        )
    }

    fn llm_key(effects: &[Effect]) -> ContextKey {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchLlm { key, .. } => Some(key.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no LLM dispatch in {:?}", effects))
    }

    #[test]
    fn abandoned_llm_call_returns_to_idle_and_redispatches() {
        let mut state = with_credential();
        let key = llm_key(&ready_with_llm(&mut state, URL));
        assert!(state.llm.is_pending());

        let effects = state.apply(Action::LlmAbandoned { key }, 0);
        assert!(effects.is_empty());
        assert_eq!(state.llm, Phase::Idle);
        assert!(!state.has_llm_credential);
        assert_eq!(state.llm_dispatches(), 0);

        let effects = state.apply(Action::LlmCredentialChanged(true), 0);
        assert_eq!(llm_effects(&effects), 1);
        assert!(state.llm.is_pending());
    }

    #[test]
    fn revisited_context_restores_relevant_recent() {
        let mut state = with_credential();
        state.apply(
            Action::RecentTagsLoaded(vec!["rust".into(), "cooking".into()]),
            0,
        );
        let key = llm_key(&ready_with_llm(&mut state, URL));
        state.apply(
            Action::RelevantRecentFulfilled {
                key: key.clone(),
                tags: vec!["rust".into()],
            },
            0,
        );
        state.apply(
            Action::LlmFulfilled {
                key,
                tags: vec!["tokio".into()],
            },
            0,
        );
        let first = display_strings(&state.display_suggestions());
        assert_eq!(first, vec!["rust", "$separator", "tokio"]);

        ready_with_llm(&mut state, OTHER);
        assert_eq!(state.relevant_recent(), None);

        let effects = ready_with_llm(&mut state, URL);
        assert_eq!(llm_effects(&effects), 0);
        assert_eq!(display_strings(&state.display_suggestions()), first);
    }
}
