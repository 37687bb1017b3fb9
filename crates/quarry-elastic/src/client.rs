//! Backend client trait and request types.
//!
//! Everything above this crate talks to the search backend through
//! [`SearchClient`], so the HTTP implementation can be swapped for a mock or
//! another transport.

use async_trait::async_trait;
use quarry_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// When a written document becomes visible to searches.
///
/// Passed by the caller of [`SearchClient::index_document`]. Statistics
/// records use [`Refresh::Immediate`]; hosts writing their own documents
/// through the client pick whichever policy suits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refresh {
    /// Use the index's refresh interval.
    #[default]
    None,
    /// Refresh the affected shards right after the write.
    Immediate,
    /// Block until the next scheduled refresh.
    WaitFor,
}

impl Refresh {
    /// Value of the `refresh` query parameter, if any.
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Refresh::None => None,
            Refresh::Immediate => Some("true"),
            Refresh::WaitFor => Some("wait_for"),
        }
    }
}

/// Mapping and analyzer used to create an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Field mappings (the `mappings` object).
    pub mappings: Map<String, Value>,
    /// Default analyzer type.
    pub analyzer: String,
}

impl IndexSettings {
    /// Create settings from a mapping object and analyzer type.
    pub fn new(mappings: Map<String, Value>, analyzer: impl Into<String>) -> Self {
        Self {
            mappings,
            analyzer: analyzer.into(),
        }
    }

    /// Request body for index creation.
    pub fn to_body(&self) -> Value {
        json!({
            "mappings": self.mappings,
            "settings": {
                "analysis": {
                    "analyzer": {
                        "default": { "type": self.analyzer }
                    }
                }
            }
        })
    }
}

/// Abstract search backend client.
///
/// # Async
///
/// Every operation is one round trip to the backend; implementations do not
/// retry.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Whether `index` exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Create `index` with the given mapping and analyzer.
    async fn create_index(&self, index: &str, settings: &IndexSettings) -> Result<()>;

    /// Run a search body against one or more indices and return the raw
    /// backend response.
    async fn search(&self, indices: &[String], body: &Value) -> Result<Value>;

    /// Store one document in `index`.
    async fn index_document(
        &self,
        index: &str,
        document: &Value,
        refresh: Refresh,
    ) -> Result<()>;

    /// Client name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
