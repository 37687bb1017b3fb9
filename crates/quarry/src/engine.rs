//! Search entry point.
//!
//! [`SearchEngine`] routes each query either to the structured path
//! (translate, search the backend, normalize) or to the free-text
//! [`FallbackSearch`], then hands the response to the [`StatsRecorder`]
//! before returning it.

use std::sync::Arc;

use quarry_core::{
    QuarryConfig, ReadinessHandle, ReadinessState, Result, SearchOptions, SearchResponse,
};
use quarry_elastic::{HttpSearchClient, SearchClient};

use crate::fallback::{ElasticFallback, FallbackSearch};
use crate::normalizer;
use crate::provisioner::{IndexProvisioner, ProvisionReport};
use crate::stats::StatsRecorder;
use crate::translator::{Translation, translate};

/// Name of the readiness handle owned by the engine.
pub const READINESS_NAME: &str = "indices";

/// Structured/free-text search over the content index.
pub struct SearchEngine {
    client: Arc<dyn SearchClient>,
    fallback: Arc<dyn FallbackSearch>,
    config: Arc<QuarryConfig>,
    stats: StatsRecorder,
    readiness: ReadinessHandle,
}

impl SearchEngine {
    /// Create an engine from its collaborators.
    pub fn new(
        client: Arc<dyn SearchClient>,
        fallback: Arc<dyn FallbackSearch>,
        config: Arc<QuarryConfig>,
    ) -> Self {
        let stats = StatsRecorder::new(Arc::clone(&client), &config);
        Self {
            client,
            fallback,
            config,
            stats,
            readiness: ReadinessHandle::new(READINESS_NAME),
        }
    }

    /// Create an engine whose free-text path is an [`ElasticFallback`]
    /// over the same client.
    pub fn with_elastic_fallback(client: Arc<dyn SearchClient>, config: Arc<QuarryConfig>) -> Self {
        let fallback = Arc::new(ElasticFallback::new(
            Arc::clone(&client),
            Arc::clone(&config),
        ));
        Self::new(client, fallback, config)
    }

    /// Create an engine talking to the configured backend over HTTP.
    pub fn connect(config: Arc<QuarryConfig>) -> Result<Self> {
        config.validate()?;
        let client: Arc<dyn SearchClient> = Arc::new(HttpSearchClient::new(&config.backend)?);
        Ok(Self::with_elastic_fallback(client, config))
    }

    /// Build a provisioner sharing this engine's client, configuration and
    /// readiness handle.
    pub fn provisioner(&self) -> Result<IndexProvisioner> {
        IndexProvisioner::new(
            Arc::clone(&self.client),
            &self.config,
            self.readiness.clone(),
        )
    }

    /// Ensure both indices exist.
    ///
    /// Fails only when the content mapping is unusable; backend failures are
    /// reported in the [`ProvisionReport`].
    pub async fn provision(&self) -> Result<ProvisionReport> {
        let provisioner = match self.provisioner() {
            Ok(p) => p,
            Err(e) => {
                self.readiness.set_state(ReadinessState::Failed(e.to_string()));
                return Err(e);
            }
        };
        Ok(provisioner.ensure_indices().await)
    }

    /// Provisioning readiness.
    pub fn readiness(&self) -> &ReadinessHandle {
        &self.readiness
    }

    /// Effective configuration.
    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    /// Statistics recorder.
    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    /// Run a search.
    ///
    /// `query` is either free text or `#PWTJSON#:` followed by a JSON
    /// descriptor. Translation and backend failures are returned; the
    /// statistics write is detached and cannot fail the search.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        match translate(query, &self.config.index.index_name)? {
            Translation::Structured {
                raw: raw_search,
                descriptor,
                compiled,
            } => {
                tracing::debug!(
                    indices = ?compiled.indices,
                    tags = descriptor.tags.len(),
                    paths = descriptor.paths.len(),
                    "Structured search"
                );
                let body = compiled.body_json()?;
                let raw = self
                    .client
                    .search(&compiled.indices, &body)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Search error"))?;
                let response = normalizer::normalize(&raw);

                self.stats.record(
                    Some(&raw_search),
                    descriptor.text.as_deref(),
                    &response,
                    &options.user_email,
                );
                Ok(response)
            }
            Translation::FreeText => {
                tracing::debug!(fallback = %self.fallback.name(), "Free-text search");
                let response = self
                    .fallback
                    .query(query, options)
                    .await
                    .inspect_err(|e| tracing::error!(error = %e, "Search error"))?;

                self.stats
                    .record(None, Some(query), &response, &options.user_email);
                Ok(response)
            }
        }
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("client", &self.client.name())
            .field("fallback", &self.fallback.name())
            .field("index", &self.config.index.index_name)
            .field("readiness", &self.readiness.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
