//! Suggestion orchestration
//!
//! Decides when a URL is stable enough to look up, runs the lookups,
//! discards stale responses, and gates LLM calls on their context.

mod context;
mod coordinator;
mod debounce;
mod state;
mod target;

pub use context::{ContextKey, ContextKeyCache, KeyDecision, LlmOutcome, SuggestionContext};
pub use coordinator::Coordinator;
pub use debounce::Debouncer;
pub use state::{Action, Effect, FetchRequest, FormData, Lookup, Phase, RequestId, SuggestState};
pub use target::is_plausible_url;
