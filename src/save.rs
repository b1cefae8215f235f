//! Bookmark save flow
//!
//! Validates the form locally, submits it, and on success appends the
//! saved tags to the recent-tag ledger.

use crate::client::{ApiError, BookmarkApi, NewPost};
use crate::suggest::{is_plausible_url, FormData};
use crate::tags::RecentTagLedger;

/// Maximum URL length the bookmarking service accepts. Longer URLs are
/// rejected locally; [`ApiError::UrlTooLong`] covers the service refusing one.
pub const MAX_URL_LEN: usize = 2048;

/// Why a save did not go through.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SaveError {
    /// Caught locally; nothing was sent
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SaveError {
    /// Form field the error belongs to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            Self::Api(ApiError::UrlTooLong) => Some("url"),
            Self::Api(_) => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.to_string(),
            Self::Api(ApiError::UrlTooLong) => "URL is too long to save.".to_string(),
            Self::Api(ApiError::Status(401 | 403)) => {
                "Pinboard rejected your credentials. Check your API token.".to_string()
            }
            Self::Api(ApiError::Status(429)) => {
                "Too many requests. Wait a moment and try again.".to_string()
            }
            Self::Api(ApiError::Status(code)) if *code >= 500 => {
                "Pinboard is unavailable. Try again later.".to_string()
            }
            Self::Api(ApiError::Transport(_)) => "Could not reach Pinboard.".to_string(),
            Self::Api(_) => "Saving the bookmark failed.".to_string(),
        }
    }
}

/// Check required fields and build the submission.
pub fn validate(form: &FormData) -> Result<NewPost, SaveError> {
    let url = form.url.trim();
    if url.is_empty() {
        return Err(SaveError::Validation {
            field: "url",
            message: "URL is required.",
        });
    }
    if !is_plausible_url(url) {
        return Err(SaveError::Validation {
            field: "url",
            message: "Enter a valid URL.",
        });
    }
    if url.len() > MAX_URL_LEN {
        return Err(SaveError::Validation {
            field: "url",
            message: "URL is too long to save.",
        });
    }
    let title = form.title.trim();
    if title.is_empty() {
        return Err(SaveError::Validation {
            field: "title",
            message: "Title is required.",
        });
    }

    let mut tags: Vec<String> = Vec::with_capacity(form.tags.len());
    for tag in form.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    Ok(NewPost {
        url: url.to_string(),
        title: title.to_string(),
        description: form.description.trim().to_string(),
        tags,
        private: form.private,
        toread: form.toread,
    })
}

/// Validate, submit, and record the saved tags as recently used.
///
/// A ledger write failure is logged and does not fail the save.
pub async fn save_bookmark(
    api: &dyn BookmarkApi,
    ledger: &RecentTagLedger,
    form: &FormData,
) -> Result<NewPost, SaveError> {
    let post = validate(form)?;
    api.add_post(&post).await.map_err(|e| {
        tracing::warn!(url = %post.url, error = %e, "saving bookmark failed");
        SaveError::from(e)
    })?;
    tracing::info!(url = %post.url, tags = post.tags.len(), "bookmark saved");

    if let Err(e) = ledger.record(&post.tags) {
        tracing::warn!(error = %e, "failed to record recent tags");
    }
    Ok(post)
}
