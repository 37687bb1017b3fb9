//! Free-text search delegate.
//!
//! Queries without the structured sentinel are handed to a
//! [`FallbackSearch`] implementation as-is, and its response is returned
//! unchanged. [`ElasticFallback`] is the stock implementation: a plain
//! boosted text search over the content index, with optional completion
//! suggestions.

use std::sync::Arc;

use async_trait::async_trait;
use quarry_core::{QuarryConfig, Result, SearchOptions, SearchResponse};
use quarry_elastic::SearchClient;
use serde_json::{Value, json};

use crate::normalizer;
use crate::translator::{PAGE_SIZE, text_clause};

/// Fields returned for free-text queries.
pub const FALLBACK_SOURCE_FIELDS: [&str; 4] = ["title", "description", "path", "locale"];

/// Number of completion options requested per suggestion entry.
pub const SUGGESTION_SIZE: usize = 5;

/// A free-text search engine.
#[async_trait]
pub trait FallbackSearch: Send + Sync {
    /// Run a free-text query.
    async fn query(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Free-text search against the content index.
pub struct ElasticFallback {
    client: Arc<dyn SearchClient>,
    config: Arc<QuarryConfig>,
}

impl ElasticFallback {
    /// Create a fallback sharing the engine's client and configuration.
    pub fn new(client: Arc<dyn SearchClient>, config: Arc<QuarryConfig>) -> Self {
        Self { client, config }
    }

    /// Build the search body for `query`.
    pub fn body(&self, query: &str) -> Value {
        let mut body = json!({
            "query": text_clause(query),
            "from": 0,
            "size": PAGE_SIZE,
            "_source": FALLBACK_SOURCE_FIELDS,
        });

        if let Some(field) = self.suggest_field() {
            body["suggest"] = json!({
                "suggestions": {
                    "text": query,
                    "completion": {
                        "field": field,
                        "size": SUGGESTION_SIZE,
                        "skip_duplicates": true,
                        "fuzzy": true
                    }
                }
            });
        }
        body
    }

    fn suggest_field(&self) -> Option<&str> {
        self.config
            .fallback
            .suggest_field
            .as_deref()
            .filter(|f| !f.is_empty())
    }
}

#[async_trait]
impl FallbackSearch for ElasticFallback {
    async fn query(&self, query: &str, _options: &SearchOptions) -> Result<SearchResponse> {
        let indices = [self.config.index.index_name.clone()];
        let raw = self.client.search(&indices, &self.body(query)).await?;

        let mut response = normalizer::normalize(&raw);
        if self.suggest_field().is_some() {
            response.suggestions = normalizer::suggestions(&raw);
        }
        Ok(response)
    }

    fn name(&self) -> &str {
        "elastic"
    }
}

impl std::fmt::Debug for ElasticFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticFallback")
            .field("client", &self.client.name())
            .field("index", &self.config.index.index_name)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
