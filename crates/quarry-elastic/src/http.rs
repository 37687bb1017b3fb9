//! Elasticsearch REST client over HTTP.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `index_exists` | `HEAD /{index}` |
//! | `create_index` | `PUT /{index}` |
//! | `search` | `POST /{i1,i2}/_search` |
//! | `index_document` | `POST /{index}/_doc?refresh=<policy>` |
//!
//! Index names are percent-encoded as single path segments, so a name can
//! never reach another endpoint. Requests rotate round-robin across the
//! configured nodes. A failed request is not retried on another node.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::{BackendConfig, Error, Result};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;

use crate::client::{IndexSettings, Refresh, SearchClient};

/// HTTP implementation of [`SearchClient`].
pub struct HttpSearchClient {
    http: reqwest::Client,
    nodes: Vec<Url>,
    next: AtomicUsize,
    credentials: Option<(String, Option<String>)>,
    name: String,
}

impl HttpSearchClient {
    /// Build a client from backend configuration.
    ///
    /// Fails with a configuration error when no nodes are configured, a node
    /// is not an absolute `http(s)` URL, or the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let nodes = config
            .nodes()
            .iter()
            .map(|node| parse_node(node))
            .collect::<Result<Vec<_>>>()?;
        if nodes.is_empty() {
            return Err(Error::config("backend.hosts lists no nodes"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.client_name.clone())
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        tracing::info!(nodes = ?config.nodes(), client = %config.client_name, "Initializing search client");

        Ok(Self {
            http,
            nodes,
            next: AtomicUsize::new(0),
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
            name: config.client_name.clone(),
        })
    }

    /// Configured node URLs.
    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }

    fn node(&self) -> &Url {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        &self.nodes[i]
    }

    /// Next node URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.node().clone();
        // Nodes are checked to be base URLs in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_deref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| Error::unavailable_with_source(format!("{context} failed"), e))
    }
}

fn parse_node(node: &str) -> Result<Url> {
    let url = Url::parse(node)
        .map_err(|e| Error::config(format!("invalid backend node '{node}': {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "backend node '{node}' is not an http(s) URL"
        )));
    }
    Ok(url)
}

/// Reject names that would not stay a single index once placed in a path.
///
/// Dot segments are dropped by URL normalization and commas delimit index
/// lists; either would widen the request to other indices.
fn index_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(',') {
        return Err(Error::translation(format!("invalid index name '{name}'")));
    }
    Ok(name)
}

/// Comma-joined index list for a multi-index path segment.
fn index_list(indices: &[String]) -> Result<String> {
    if indices.is_empty() {
        return Err(Error::translation("no index to search"));
    }
    for index in indices {
        index_name(index)?;
    }
    Ok(indices.join(","))
}

/// Turn a non-success response into [`Error::Backend`].
async fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %context, %body, "Backend rejected request");
    let message = if body.is_empty() {
        format!("{context}: {status}")
    } else {
        format!("{context}: {body}")
    };
    Err(Error::backend(status.as_u16(), message))
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let index = index_name(index)?;
        let context = format!("HEAD /{index}");
        let request = self.http.head(self.url(&[index]));
        let response = self.send(request, &context).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => ensure_success(response, &context).await.map(|_| false),
        }
    }

    async fn create_index(&self, index: &str, settings: &IndexSettings) -> Result<()> {
        let index = index_name(index)?;
        let context = format!("PUT /{index}");
        let request = self.http.put(self.url(&[index])).json(&settings.to_body());
        let response = self.send(request, &context).await?;
        ensure_success(response, &context).await?;
        Ok(())
    }

    async fn search(&self, indices: &[String], body: &Value) -> Result<Value> {
        let list = index_list(indices)?;
        let context = format!("POST /{list}/_search");
        let request = self.http.post(self.url(&[&list, "_search"])).json(body);
        let response = self.send(request, &context).await?;
        let response = ensure_success(response, &context).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::unavailable_with_source(format!("{context}: unreadable body"), e))
    }

    async fn index_document(
        &self,
        index: &str,
        document: &Value,
        refresh: Refresh,
    ) -> Result<()> {
        let index = index_name(index)?;
        let mut url = self.url(&[index, "_doc"]);
        if let Some(param) = refresh.as_param() {
            url.query_pairs_mut().append_pair("refresh", param);
        }
        let context = format!("POST /{index}/_doc");
        let request = self.http.post(url).json(document);
        let response = self.send(request, &context).await?;
        ensure_success(response, &context).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for HttpSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchClient")
            .field("nodes", &self.nodes)
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
