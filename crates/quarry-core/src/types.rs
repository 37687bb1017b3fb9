//! Shared data model: search results, responses, and statistics records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single normalized search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Backend document identifier.
    pub id: String,

    /// Page locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Page path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Page title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Page description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Page tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Backend relevance score.
    #[serde(default)]
    pub score: f64,
}

/// Results of one search, in backend relevance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Hits, as ordered by the backend.
    pub results: Vec<SearchResult>,

    /// Spelling/completion suggestions.
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Total matching documents (may exceed `results.len()`).
    #[serde(default)]
    pub total_hits: u64,
}

impl SearchResponse {
    /// Create an empty response.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Per-request options supplied by the host application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Email of the user issuing the search.
    pub user_email: String,
}

impl SearchOptions {
    /// Options for a search issued by `email`.
    pub fn for_user(email: impl Into<String>) -> Self {
        Self {
            user_email: email.into(),
        }
    }
}

/// Requesting identity stored with each statistics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatUser {
    /// User email.
    pub email: String,
}

/// Extra statistics payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatExtra {
    /// Structured descriptor as received, `null` for free-text queries.
    pub raw_search: Option<Value>,
}

/// One document in the statistics index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    /// Search terms: descriptor text or the raw free-text query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,

    /// Response returned to the caller.
    pub results: SearchResponse,

    /// Extra payload.
    pub extra: StatExtra,

    /// Requesting user.
    pub user: StatUser,

    /// Write time, epoch milliseconds.
    pub ts: i64,
}
