//! Index provisioning.
//!
//! Ensures the content index and the statistics index exist. Both are
//! checked (and created when missing) concurrently, and provisioning only
//! settles once both have finished. Backend failures are logged and
//! recorded in the [`ProvisionReport`]; they never abort startup. A content
//! mapping that does not parse does abort startup, at construction time.

use std::fmt;
use std::sync::Arc;

use quarry_core::{QuarryConfig, ReadinessHandle, ReadinessState, Result};
use quarry_elastic::{IndexSettings, SearchClient};
use serde_json::{Map, Value, json};

/// Fixed mapping of the statistics index.
pub fn stats_mapping() -> Map<String, Value> {
    let mapping = json!({
        "properties": {
            "terms": { "type": "text", "fields": { "kw": { "type": "keyword" } } },
            "results": { "type": "object" },
            "extra": { "type": "object" },
            "user": { "type": "object" },
            "ts": { "type": "date" }
        }
    });
    match mapping {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// What happened to one index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
    /// The index already existed; nothing was created.
    Existing,
    /// The index was missing and has been created.
    Created,
    /// The check or the creation failed.
    Failed(String),
}

impl IndexOutcome {
    /// Returns `true` for [`IndexOutcome::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for IndexOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing => write!(f, "existing"),
            Self::Created => write!(f, "created"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of one provisioning run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionReport {
    /// Content index name and outcome.
    pub content: (String, IndexOutcome),
    /// Statistics index name and outcome.
    pub stats: (String, IndexOutcome),
}

impl ProvisionReport {
    /// Both indices exist.
    pub fn is_complete(&self) -> bool {
        !self.content.1.is_failed() && !self.stats.1.is_failed()
    }

    /// Number of indices created by this run.
    pub fn created(&self) -> usize {
        [&self.content.1, &self.stats.1]
            .into_iter()
            .filter(|o| **o == IndexOutcome::Created)
            .count()
    }

    /// Names of the indices that could not be ensured.
    pub fn failed_indices(&self) -> Vec<&str> {
        [&self.content, &self.stats]
            .into_iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Creates the managed indices when they are missing.
pub struct IndexProvisioner {
    client: Arc<dyn SearchClient>,
    content_index: String,
    content_settings: IndexSettings,
    stats_index: String,
    stats_settings: IndexSettings,
    readiness: ReadinessHandle,
}

impl IndexProvisioner {
    /// Create a provisioner.
    ///
    /// Fails with a configuration error when the content mapping is not a
    /// valid JSON object.
    pub fn new(
        client: Arc<dyn SearchClient>,
        config: &QuarryConfig,
        readiness: ReadinessHandle,
    ) -> Result<Self> {
        let analyzer = config.index.analyzer.clone();
        Ok(Self {
            client,
            content_index: config.index.index_name.clone(),
            content_settings: IndexSettings::new(config.index.content_mapping()?, &analyzer),
            stats_index: config.index.stats_index_name.clone(),
            stats_settings: IndexSettings::new(stats_mapping(), analyzer),
            readiness,
        })
    }

    /// Readiness handle updated by [`ensure_indices`](Self::ensure_indices).
    pub fn readiness(&self) -> &ReadinessHandle {
        &self.readiness
    }

    /// Ensure both indices exist.
    ///
    /// Never fails; inspect the report (or the readiness handle) for
    /// indices that could not be ensured.
    pub async fn ensure_indices(&self) -> ProvisionReport {
        self.readiness.set_state(ReadinessState::Provisioning);

        let (content, stats) = tokio::join!(
            self.ensure(&self.content_index, &self.content_settings),
            self.ensure(&self.stats_index, &self.stats_settings),
        );

        let report = ProvisionReport {
            content: (self.content_index.clone(), content),
            stats: (self.stats_index.clone(), stats),
        };

        if report.is_complete() {
            tracing::info!(
                content = %report.content.1,
                stats = %report.stats.1,
                "Indices provisioned"
            );
            self.readiness.set_state(ReadinessState::Ready);
        } else {
            let failed = report.failed_indices().join(", ");
            self.readiness
                .set_state(ReadinessState::Degraded(format!("missing indices: {failed}")));
        }
        report
    }

    async fn ensure(&self, index: &str, settings: &IndexSettings) -> IndexOutcome {
        match self.try_ensure(index, settings).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(index = %index, error = %e, "Index create error");
                IndexOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_ensure(&self, index: &str, settings: &IndexSettings) -> Result<IndexOutcome> {
        if self.client.index_exists(index).await? {
            tracing::debug!(index = %index, "Index already exists");
            return Ok(IndexOutcome::Existing);
        }

        tracing::info!(index = %index, analyzer = %settings.analyzer, "Creating index");
        self.client.create_index(index, settings).await?;
        Ok(IndexOutcome::Created)
    }
}

impl fmt::Debug for IndexProvisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexProvisioner")
            .field("client", &self.client.name())
            .field("content_index", &self.content_index)
            .field("stats_index", &self.stats_index)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
