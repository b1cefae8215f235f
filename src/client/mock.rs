//! Mock collaborators for testing: preconfigured responses and delays.
//!
//! Delays use `tokio::time::sleep`, so tests running on a paused clock
//! can force any completion order between concurrent fetches.

use super::bookmarks::{ApiError, BookmarkApi, NewPost, PinboardSuggestions, Post};
use super::llm::{LlmApi, LlmError, LlmRequest};
use crate::tags::TagCountsMap;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock bookmarking API keyed by URL.
pub struct MockBookmarkApi {
    posts: HashMap<String, Result<Option<Post>, ApiError>>,
    suggestions: HashMap<String, Result<PinboardSuggestions, ApiError>>,
    delays: HashMap<String, Duration>,
    tags: Mutex<Result<TagCountsMap, ApiError>>,
    add_result: Option<ApiError>,
    added: Mutex<Vec<NewPost>>,
    post_calls: AtomicUsize,
    suggest_calls: AtomicUsize,
    tag_calls: AtomicUsize,
}

impl Default for MockBookmarkApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBookmarkApi {
    pub fn new() -> Self {
        Self {
            posts: HashMap::new(),
            suggestions: HashMap::new(),
            delays: HashMap::new(),
            tags: Mutex::new(Ok(TagCountsMap::new())),
            add_result: None,
            added: Mutex::new(Vec::new()),
            post_calls: AtomicUsize::new(0),
            suggest_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_post(mut self, url: impl Into<String>, post: Option<Post>) -> Self {
        self.posts.insert(url.into(), Ok(post));
        self
    }

    pub fn with_post_failure(mut self, url: impl Into<String>, error: ApiError) -> Self {
        self.posts.insert(url.into(), Err(error));
        self
    }

    pub fn with_suggestions(mut self, url: impl Into<String>, s: PinboardSuggestions) -> Self {
        self.suggestions.insert(url.into(), Ok(s));
        self
    }

    pub fn with_suggest_failure(mut self, url: impl Into<String>, error: ApiError) -> Self {
        self.suggestions.insert(url.into(), Err(error));
        self
    }

    /// Delay every lookup for `url` by `delay`.
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    pub fn with_tags(self, tags: TagCountsMap) -> Self {
        self.set_tags(Ok(tags));
        self
    }

    pub fn with_add_failure(mut self, error: ApiError) -> Self {
        self.add_result = Some(error);
        self
    }

    /// Replace the `all_tags` response for subsequent calls.
    pub fn set_tags(&self, tags: Result<TagCountsMap, ApiError>) {
        if let Ok(mut slot) = self.tags.lock() {
            *slot = tags;
        }
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn suggest_calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }

    pub fn added(&self) -> Vec<NewPost> {
        self.added.lock().map(|a| a.clone()).unwrap_or_default()
    }

    async fn delay_for(&self, url: &str) {
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl BookmarkApi for MockBookmarkApi {
    async fn get_post(&self, url: &str) -> Result<Option<Post>, ApiError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        self.delay_for(url).await;
        self.posts.get(url).cloned().unwrap_or(Ok(None))
    }

    async fn suggest(&self, url: &str) -> Result<PinboardSuggestions, ApiError> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        self.delay_for(url).await;
        self.suggestions
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(PinboardSuggestions::default()))
    }

    async fn all_tags(&self) -> Result<TagCountsMap, ApiError> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        self.tags
            .lock()
            .map_err(|_| ApiError::Transport("mock poisoned".into()))?
            .clone()
    }

    async fn add_post(&self, post: &NewPost) -> Result<(), ApiError> {
        if let Some(error) = &self.add_result {
            return Err(error.clone());
        }
        if let Ok(mut added) = self.added.lock() {
            added.push(post.clone());
        }
        Ok(())
    }
}

/// Mock LLM provider returning a fixed reply.
pub struct MockLlm {
    reply: Result<String, LlmError>,
    relevant: Option<Result<Vec<String>, LlmError>>,
    verify: Result<(), LlmError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
    filter_calls: AtomicUsize,
}

impl MockLlm {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            relevant: None,
            verify: Ok(()),
            delay: None,
            requests: Mutex::new(Vec::new()),
            filter_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            reply: Err(error.clone()),
            verify: Err(error),
            ..Self::replying("")
        }
    }

    /// Configure the relevance pass. Without this, candidates pass through.
    pub fn with_relevant(mut self, relevant: Result<Vec<String>, LlmError>) -> Self {
        self.relevant = Some(relevant);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every suggestion request received, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn suggest_calls(&self) -> usize {
        self.requests().len()
    }

    pub fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmApi for MockLlm {
    async fn suggest_tags(&self, request: &LlmRequest, _token: &str) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }

    async fn filter_relevant(
        &self,
        _request: &LlmRequest,
        candidates: &[String],
        _token: &str,
    ) -> Result<Vec<String>, LlmError> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        match &self.relevant {
            Some(relevant) => relevant.clone(),
            None => Ok(candidates.to_vec()),
        }
    }

    async fn verify(&self, _token: &str) -> Result<(), LlmError> {
        self.verify.clone()
    }
}
