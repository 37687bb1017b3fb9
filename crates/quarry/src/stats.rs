//! Search statistics side channel.
//!
//! Every search produces one [`StatRecord`] written to the statistics
//! index on a detached task. A failed write is logged and dropped; it never
//! reaches the caller of the search.

use std::sync::Arc;

use quarry_core::{
    Error, QuarryConfig, Result, SearchResponse, StatExtra, StatRecord, StatUser,
};
use quarry_elastic::{Refresh, SearchClient};
use serde_json::Value;
use tokio::task::JoinHandle;

/// Writes search statistics.
#[derive(Clone)]
pub struct StatsRecorder {
    client: Arc<dyn SearchClient>,
    index: String,
    enabled: bool,
}

impl StatsRecorder {
    /// Create a recorder writing to the configured statistics index.
    pub fn new(client: Arc<dyn SearchClient>, config: &QuarryConfig) -> Self {
        Self {
            client,
            index: config.index.stats_index_name.clone(),
            enabled: config.stats.enabled,
        }
    }

    /// Statistics index name.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Whether records are written at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one search without waiting for the write.
    ///
    /// `raw_search` is the structured payload as received, `None` for free
    /// text. `terms` is stored as given, empty strings included.
    ///
    /// Returns the write task, or `None` when statistics are disabled.
    /// Must be called from within a tokio runtime.
    pub fn record(
        &self,
        raw_search: Option<&Value>,
        terms: Option<&str>,
        response: &SearchResponse,
        user_email: &str,
    ) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let recorder = self.clone();
        let raw_search = raw_search.cloned();
        let terms = terms.map(str::to_string);
        let results = response.clone();
        let user = StatUser {
            email: user_email.to_string(),
        };

        Some(tokio::spawn(async move {
            let record = StatRecord {
                terms,
                results,
                extra: StatExtra { raw_search },
                user,
                ts: chrono::Utc::now().timestamp_millis(),
            };
            if let Err(e) = recorder.write(&record).await {
                tracing::error!(
                    index = %recorder.index,
                    error = %Error::stats_write(&e),
                    "Search stats not written"
                );
            }
        }))
    }

    /// Write one record and wait for the backend to acknowledge it.
    pub async fn write(&self, record: &StatRecord) -> Result<()> {
        let document = serde_json::to_value(record)?;
        self.client
            .index_document(&self.index, &document, Refresh::Immediate)
            .await?;
        tracing::debug!(index = %self.index, terms = ?record.terms, "Search stats written");
        Ok(())
    }
}

impl std::fmt::Debug for StatsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsRecorder")
            .field("client", &self.client.name())
            .field("index", &self.index)
            .field("enabled", &self.enabled)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
