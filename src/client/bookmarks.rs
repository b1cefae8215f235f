//! Bookmarking API contract
//!
//! Transport lives outside this crate. Implementors translate HTTP
//! failures into `ApiError` once, at the boundary.

use crate::tags::TagCountsMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An existing bookmark returned by the details lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub toread: bool,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Page metadata the suggestion endpoint may return alongside tags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePreview {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response of the Pinboard suggestion endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PinboardSuggestions {
    #[serde(default)]
    pub popular: Vec<String>,
    #[serde(default)]
    pub recommended: Vec<String>,
    #[serde(default)]
    pub preview: Option<PagePreview>,
}

impl PinboardSuggestions {
    /// Raw candidate list: popular first, then recommended.
    pub fn raw_tags(&self) -> Vec<String> {
        self.popular
            .iter()
            .chain(self.recommended.iter())
            .cloned()
            .collect()
    }
}

/// A bookmark being submitted by the save flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub private: bool,
    pub toread: bool,
}

/// Errors from the bookmarking API, classified at the boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("URL is too long")]
    UrlTooLong,
    #[error("API returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response parse error: {0}")]
    Parse(String),
}

/// Client trait for the bookmarking service.
#[async_trait]
pub trait BookmarkApi: Send + Sync {
    /// Look up an existing bookmark for `url`. `Ok(None)` means not found.
    async fn get_post(&self, url: &str) -> Result<Option<Post>, ApiError>;

    /// Fetch the service's tag suggestions for `url`.
    async fn suggest(&self, url: &str) -> Result<PinboardSuggestions, ApiError>;

    /// Fetch the user's full tag vocabulary with usage counts.
    async fn all_tags(&self) -> Result<TagCountsMap, ApiError>;

    /// Create or replace a bookmark.
    async fn add_post(&self, post: &NewPost) -> Result<(), ApiError>;
}
