//! LLM suggestion contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Inputs for an LLM tag-suggestion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub url: String,
    pub title: String,
    pub description: String,
    pub existing_tags: Vec<String>,
}

/// Errors from LLM calls, classified once at the boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM credential rejected")]
    Auth,
    #[error("LLM rate limit reached")]
    RateLimit,
    #[error("LLM service unreachable")]
    Connectivity,
    #[error("LLM error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// Message shown in the credential-verification flow.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth => "Invalid API key. Check the key and try again.".to_string(),
            Self::RateLimit => {
                "Rate limit or quota exceeded. Wait a moment or check your plan.".to_string()
            }
            Self::Connectivity => {
                "Could not reach the LLM service. Check your connection.".to_string()
            }
            Self::Unknown(msg) => format!("Unexpected error: {}", msg),
        }
    }
}

/// Client trait for the LLM provider.
#[async_trait]
pub trait LlmApi: Send + Sync {
    /// Ask for tag suggestions. The reply is a comma-separated tag string.
    async fn suggest_tags(&self, request: &LlmRequest, token: &str) -> Result<String, LlmError>;

    /// Keep only the `candidates` relevant to the page described by `request`.
    async fn filter_relevant(
        &self,
        request: &LlmRequest,
        candidates: &[String],
        token: &str,
    ) -> Result<Vec<String>, LlmError>;

    /// Check that `token` is accepted.
    async fn verify(&self, token: &str) -> Result<(), LlmError>;
}

/// Split a comma-separated LLM reply into trimmed, non-empty tags.
pub fn parse_llm_tags(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Verify an LLM credential, returning the user-facing message on failure.
pub async fn verify_llm_credential(llm: &dyn LlmApi, token: &str) -> Result<(), String> {
    if token.trim().is_empty() {
        return Err("API key is required.".to_string());
    }
    llm.verify(token).await.map_err(|e| {
        tracing::info!(error = %e, "LLM credential verification failed");
        e.user_message()
    })
}
