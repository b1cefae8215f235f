//! Credential store contract

use crate::storage::{keys, KeyValueStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stored account credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub token: String,
    #[serde(default, rename = "llmToken", skip_serializing_if = "Option::is_none")]
    pub llm_token: Option<String>,
}

impl Credentials {
    /// The LLM credential, if one is present and non-blank.
    pub fn llm_token(&self) -> Option<&str> {
        self.llm_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

pub trait CredentialStore: Send + Sync {
    fn read(&self) -> Option<Credentials>;
    fn write(&self, credentials: &Credentials) -> StorageResult<()>;
}

/// Credentials persisted as JSON under [`keys::CREDENTIALS`].
pub struct StoredCredentials {
    store: Arc<dyn KeyValueStore>,
}

impl StoredCredentials {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl CredentialStore for StoredCredentials {
    fn read(&self) -> Option<Credentials> {
        let raw = match self.store.get(keys::CREDENTIALS) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read credentials");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unparseable credentials");
                None
            }
        }
    }

    fn write(&self, credentials: &Credentials) -> StorageResult<()> {
        let json = serde_json::to_string(credentials)?;
        self.store.set(keys::CREDENTIALS, &json)
    }
}
