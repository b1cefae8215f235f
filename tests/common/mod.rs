//! Shared fixtures for coordinator integration tests
//!
//! Builds a coordinator wired to mock collaborators over a chosen
//! key-value store, with a manual wall clock.

#![allow(dead_code)]

use pinsuggest::client::{MockBookmarkApi, MockLlm};
use pinsuggest::{
    Coordinator, CredentialStore, Credentials, KeyValueStore, ManualClock, MemoryStore,
    RecentTagLedger, StoredCredentials, SuggestConfig,
};
use std::sync::Arc;
use std::time::Duration;

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub coordinator: Coordinator,
    pub api: Arc<MockBookmarkApi>,
    pub llm: Arc<MockLlm>,
    pub ledger: Arc<RecentTagLedger>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: ManualClock,
}

pub struct HarnessBuilder {
    api: MockBookmarkApi,
    llm: MockLlm,
    llm_token: bool,
    store: Arc<dyn KeyValueStore>,
    clock: ManualClock,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            api: MockBookmarkApi::new(),
            llm: MockLlm::replying(""),
            llm_token: false,
            store: Arc::new(MemoryStore::new()),
            clock: ManualClock::new(START_MILLIS),
        }
    }

    pub fn api(mut self, api: MockBookmarkApi) -> Self {
        self.api = api;
        self
    }

    /// Use `llm` and store an LLM credential.
    pub fn llm(mut self, llm: MockLlm) -> Self {
        self.llm = llm;
        self.llm_token = true;
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn clock(mut self, clock: ManualClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Harness {
        let credentials = StoredCredentials::new(self.store.clone());
        credentials
            .write(&Credentials {
                user: "tester".into(),
                token: "tester:TOKEN".into(),
                llm_token: self.llm_token.then(|| "sk-test".to_string()),
            })
            .expect("write credentials");

        let config = SuggestConfig::default();
        let clock = Arc::new(self.clock.clone());
        let ledger = Arc::new(RecentTagLedger::new(
            self.store.clone(),
            clock.clone(),
            config.recent_ttl,
        ));
        let api = Arc::new(self.api);
        let llm = Arc::new(self.llm);
        let coordinator = Coordinator::new(
            api.clone(),
            llm.clone(),
            Arc::new(credentials),
            ledger.clone(),
            clock,
            &config,
        );
        coordinator.start();

        Harness {
            coordinator,
            api,
            llm,
            ledger,
            store: self.store,
            clock: self.clock,
        }
    }
}

/// Let spawned tasks run and advance paused time by `ms`.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|t| t.to_string()).collect()
}
