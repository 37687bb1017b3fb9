//! In-memory [`SearchClient`] for tests.
//!
//! Records every call, answers searches from a queue of canned responses,
//! and can be told to fail specific operations. Available with the `mock`
//! feature.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::{Error, Result};
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::client::{IndexSettings, Refresh, SearchClient};

/// A call received by [`MockSearchClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `index_exists(index)`
    IndexExists(String),
    /// `create_index(index, settings)`
    CreateIndex {
        /// Target index
        index: String,
        /// Settings sent
        settings: IndexSettings,
    },
    /// `search(indices, body)`
    Search {
        /// Target indices
        indices: Vec<String>,
        /// Search body
        body: Value,
    },
    /// `index_document(index, document, refresh)`
    IndexDocument {
        /// Target index
        index: String,
        /// Document body
        document: Value,
        /// Refresh policy
        refresh: Refresh,
    },
}

#[derive(Default)]
struct MockState {
    existing: HashSet<String>,
    calls: Vec<Call>,
    responses: VecDeque<Value>,
    fail_exists: HashSet<String>,
    fail_create: HashSet<String>,
    fail_writes: HashSet<String>,
    fail_search: bool,
}

/// Recording search client.
#[derive(Default)]
pub struct MockSearchClient {
    state: Mutex<MockState>,
    written: Notify,
}

impl MockSearchClient {
    /// Create a client with no indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client where `indices` already exist.
    pub fn with_existing_indices(indices: &[&str]) -> Self {
        let client = Self::new();
        client
            .lock()
            .existing
            .extend(indices.iter().map(|i| i.to_string()));
        client
    }

    /// Queue a raw backend response for the next `search` call.
    pub fn push_search_response(&self, response: Value) {
        self.lock().responses.push_back(response);
    }

    /// Make `index_exists(index)` fail.
    pub fn fail_exists(&self, index: &str) {
        self.lock().fail_exists.insert(index.to_string());
    }

    /// Make `create_index(index, ..)` fail.
    pub fn fail_create(&self, index: &str) {
        self.lock().fail_create.insert(index.to_string());
    }

    /// Make `index_document(index, ..)` fail.
    pub fn fail_writes(&self, index: &str) {
        self.lock().fail_writes.insert(index.to_string());
    }

    /// Make every `search` fail.
    pub fn fail_search(&self) {
        self.lock().fail_search = true;
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Indices passed to `create_index`, in call order.
    pub fn created_indices(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateIndex { index, .. } => Some(index.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(indices, body)` of every `search` call.
    pub fn searches(&self) -> Vec<(Vec<String>, Value)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Search { indices, body } => Some((indices.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    /// Documents sent to `index`, including rejected writes.
    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::IndexDocument {
                    index: i, document, ..
                } if i == index => Some(document.clone()),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` writes to `index` were attempted.
    ///
    /// Returns `false` on timeout.
    pub async fn wait_for_documents(&self, index: &str, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.written.notified();
                if self.documents(index).len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn empty_response() -> Value {
    json!({ "hits": { "total": { "value": 0 }, "hits": [] } })
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let mut state = self.lock();
        state.calls.push(Call::IndexExists(index.to_string()));
        if state.fail_exists.contains(index) {
            return Err(Error::unavailable(format!("HEAD /{index} failed")));
        }
        Ok(state.existing.contains(index))
    }

    async fn create_index(&self, index: &str, settings: &IndexSettings) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call::CreateIndex {
            index: index.to_string(),
            settings: settings.clone(),
        });
        if state.fail_create.contains(index) {
            return Err(Error::backend(400, format!("PUT /{index}: rejected")));
        }
        state.existing.insert(index.to_string());
        Ok(())
    }

    async fn search(&self, indices: &[String], body: &Value) -> Result<Value> {
        let mut state = self.lock();
        state.calls.push(Call::Search {
            indices: indices.to_vec(),
            body: body.clone(),
        });
        if state.fail_search {
            return Err(Error::unavailable("search failed"));
        }
        Ok(state.responses.pop_front().unwrap_or_else(empty_response))
    }

    async fn index_document(
        &self,
        index: &str,
        document: &Value,
        refresh: Refresh,
    ) -> Result<()> {
        let result = {
            let mut state = self.lock();
            state.calls.push(Call::IndexDocument {
                index: index.to_string(),
                document: document.clone(),
                refresh,
            });
            if state.fail_writes.contains(index) {
                Err(Error::backend(503, format!("POST /{index}/_doc: unavailable")))
            } else {
                Ok(())
            }
        };
        self.written.notify_waiters();
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}
