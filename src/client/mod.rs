//! External collaborators consumed by the suggestion subsystem
//!
//! Contracts only: the bookmarking service, the LLM provider, and the
//! credential store. Network transport is supplied by the host.

mod bookmarks;
mod credentials;
mod llm;
pub mod mock;

pub use bookmarks::{ApiError, BookmarkApi, NewPost, PagePreview, PinboardSuggestions, Post};
pub use credentials::{CredentialStore, Credentials, StoredCredentials};
pub use llm::{parse_llm_tags, verify_llm_credential, LlmApi, LlmError, LlmRequest};
pub use mock::{MockBookmarkApi, MockLlm};
