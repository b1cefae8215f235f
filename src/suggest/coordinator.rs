//! Fetch coordinator: the async driver around [`SuggestState`]
//!
//! The state lives in a `watch` channel so every transition is applied
//! atomically and observers see each one. Effects become spawned tasks;
//! their results re-enter as actions. Superseded fetches are never
//! aborted, only discarded when they report back.

use super::debounce::Debouncer;
use super::state::{Action, Effect, FormData, SuggestState};
use crate::client::{parse_llm_tags, BookmarkApi, CredentialStore, LlmApi, LlmError};
use crate::clock::Clock;
use crate::config::SuggestConfig;
use crate::save::{save_bookmark, SaveError};
use crate::tags::{RecentTagLedger, SuggestionItem, TagCountsMap};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct Inner {
    store: watch::Sender<SuggestState>,
    bookmarks: Arc<dyn BookmarkApi>,
    llm: Arc<dyn LlmApi>,
    credentials: Arc<dyn CredentialStore>,
    ledger: Arc<RecentTagLedger>,
    clock: Arc<dyn Clock>,
}

impl Inner {
    fn dispatch(self: &Arc<Self>, action: Action) {
        let now = self.clock.now_millis();
        let mut effects = Vec::new();
        self.store.send_modify(|state| effects = state.apply(action, now));
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(self: &Arc<Self>, effect: Effect) {
        let inner = self.clone();
        tokio::spawn(async move {
            let action = match effect {
                Effect::FetchDetails(request) => {
                    match inner.bookmarks.get_post(&request.target_url).await {
                        Ok(post) => Action::DetailsFulfilled { request, post },
                        Err(e) => Action::DetailsRejected {
                            request,
                            error: e.to_string(),
                        },
                    }
                }
                Effect::FetchSuggestions(request) => {
                    match inner.bookmarks.suggest(&request.target_url).await {
                        Ok(suggestions) => Action::SuggestionsFulfilled {
                            request,
                            suggestions,
                        },
                        Err(e) => Action::SuggestionsRejected {
                            request,
                            error: e.to_string(),
                        },
                    }
                }
                Effect::FetchLlm { key, request } => {
                    let Some(token) = inner.llm_token() else {
                        debug!("LLM credential removed before dispatch");
                        inner.dispatch(Action::LlmAbandoned { key });
                        return;
                    };
                    match inner.llm.suggest_tags(&request, &token).await {
                        Ok(reply) => Action::LlmFulfilled {
                            key,
                            tags: parse_llm_tags(&reply),
                        },
                        Err(error) => {
                            warn!(%error, url = %request.url, "LLM suggestion failed");
                            Action::LlmRejected { key, error }
                        }
                    }
                }
                Effect::FilterRecent {
                    key,
                    request,
                    candidates,
                } => {
                    let Some(token) = inner.llm_token() else {
                        inner.dispatch(Action::RelevantRecentRejected {
                            key,
                            error: LlmError::Auth,
                        });
                        return;
                    };
                    match inner.llm.filter_relevant(&request, &candidates, &token).await {
                        Ok(tags) => Action::RelevantRecentFulfilled { key, tags },
                        Err(error) => Action::RelevantRecentRejected { key, error },
                    }
                }
            };
            inner.dispatch(action);
        });
    }

    fn llm_token(&self) -> Option<String> {
        self.credentials
            .read()
            .and_then(|c| c.llm_token().map(str::to_string))
    }
}

/// Orchestrates lookups for one popup session.
///
/// Must be created and used inside a tokio runtime.
pub struct Coordinator {
    inner: Arc<Inner>,
    debouncer: Debouncer<String>,
}

impl Coordinator {
    pub fn new(
        bookmarks: Arc<dyn BookmarkApi>,
        llm: Arc<dyn LlmApi>,
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<RecentTagLedger>,
        clock: Arc<dyn Clock>,
        config: &SuggestConfig,
    ) -> Self {
        let (store, _) = watch::channel(SuggestState::new());
        let inner = Arc::new(Inner {
            store,
            bookmarks,
            llm,
            credentials,
            ledger,
            clock,
        });

        let settle = inner.clone();
        let debouncer = Debouncer::new(config.debounce, move |url: String| {
            settle.dispatch(Action::UrlSettled(url));
        });

        Self { inner, debouncer }
    }

    /// Load local state: recent tags and credential presence.
    pub fn start(&self) {
        self.inner.dispatch(Action::RecentTagsLoaded(self.inner.ledger.list()));
        self.refresh_credentials();
    }

    /// Open on a known URL (the active tab), skipping the quiet period.
    pub fn open(&self, url: &str) {
        self.debouncer.cancel();
        self.inner.dispatch(Action::UrlEdited(url.to_string()));
        self.inner.dispatch(Action::UrlSettled(url.to_string()));
    }

    /// Raw URL edit; a lookup follows once the text is stable.
    pub fn edit_url(&self, raw: &str) {
        self.inner.dispatch(Action::UrlEdited(raw.to_string()));
        self.debouncer.push(raw.to_string());
    }

    pub fn edit_title(&self, title: &str) {
        self.inner.dispatch(Action::TitleEdited(title.to_string()));
    }

    pub fn edit_description(&self, description: &str) {
        self.inner
            .dispatch(Action::DescriptionEdited(description.to_string()));
    }

    pub fn edit_tags(&self, tags: Vec<String>) {
        self.inner.dispatch(Action::TagsEdited(tags));
    }

    pub fn set_private(&self, private: bool) {
        self.inner.dispatch(Action::PrivateSet(private));
    }

    pub fn set_toread(&self, toread: bool) {
        self.inner.dispatch(Action::ToReadSet(toread));
    }

    /// Re-read the credential store, e.g. after the settings page saved.
    pub fn refresh_credentials(&self) {
        let present = self.inner.llm_token().is_some();
        self.inner.dispatch(Action::LlmCredentialChanged(present));
    }

    pub fn set_tag_counts(&self, counts: TagCountsMap) {
        self.inner.dispatch(Action::TagCountsUpdated(counts));
    }

    /// Forward every vocabulary update from `rx` until it closes.
    pub fn follow_tag_counts(&self, mut rx: watch::Receiver<TagCountsMap>) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            loop {
                let counts = rx.borrow_and_update().clone();
                inner.dispatch(Action::TagCountsUpdated(counts));
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SuggestState {
        self.inner.store.borrow().clone()
    }

    pub fn form(&self) -> FormData {
        self.inner.store.borrow().form.clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SuggestState> {
        self.inner.store.subscribe()
    }

    pub fn suggestions(&self) -> Vec<SuggestionItem> {
        self.inner.store.borrow().display_suggestions()
    }

    /// Save the current form and refresh the recent tags on success.
    pub async fn save(&self) -> Result<(), SaveError> {
        let form = self.form();
        save_bookmark(self.inner.bookmarks.as_ref(), &self.inner.ledger, &form).await?;
        self.inner
            .dispatch(Action::RecentTagsLoaded(self.inner.ledger.list()));
        Ok(())
    }
}
