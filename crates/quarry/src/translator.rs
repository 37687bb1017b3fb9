//! Query translation: mode decision and structured-query compilation.
//!
//! A structured descriptor compiles to one backend search body:
//!
//! ```json
//! {
//!   "query": { "bool": { "must": [..text..], "filter": [..tags.., ..paths..] } },
//!   "indices_boost": [ { "wiki": 2 } ],
//!   "from": 0,
//!   "size": 50,
//!   "_source": ["title", "description", "path", "locale", "tags"]
//! }
//! ```

use quarry_core::Result;
use serde::Serialize;
use serde_json::{Value, json};

use crate::descriptor::{IndexBoost, QueryDescriptor, is_structured, parse_raw};

/// Fixed page size.
pub const PAGE_SIZE: usize = 50;

/// Boosted text fields for the multi-field match.
pub const TEXT_FIELDS: [&str; 4] = ["title^20", "description^3", "tags^8", "content^1"];

/// Fields returned for structured queries.
pub const SOURCE_FIELDS: [&str; 5] = ["title", "description", "path", "locale", "tags"];

/// Unanalyzed tag field used for tag filtering.
pub const TAGS_RAW_FIELD: &str = "tags.kw";

/// Unanalyzed path field used for path-prefix filtering.
pub const PATH_RAW_FIELD: &str = "path.kw";

/// Outcome of translating a caller query.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// Structured query, ready to send to the backend.
    Structured {
        /// JSON payload exactly as the caller sent it.
        raw: Value,
        /// Descriptor as parsed.
        descriptor: QueryDescriptor,
        /// Compiled backend query.
        compiled: CompiledQuery,
    },
    /// Opaque free text for the fallback search.
    FreeText,
}

/// `bool` query clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    /// Scoring clauses, all required.
    pub must: Vec<Value>,
    /// Non-scoring clauses, all required.
    pub filter: Vec<Value>,
}

/// Top-level `query` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryClause {
    /// The boolean query.
    pub bool: BoolQuery,
}

/// Backend search request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
    /// Query.
    pub query: QueryClause,
    /// Per-index boosts, aligned with [`CompiledQuery::indices`].
    pub indices_boost: Vec<IndexBoost>,
    /// Offset.
    pub from: usize,
    /// Page size.
    pub size: usize,
    /// Projected fields.
    #[serde(rename = "_source")]
    pub source: Vec<String>,
}

/// A compiled structured query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Indices to search, in descriptor order.
    pub indices: Vec<String>,
    /// Request body.
    pub body: SearchBody,
}

impl CompiledQuery {
    /// The body as JSON.
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.body)?)
    }
}

/// Decide the query mode and compile structured queries.
///
/// `default_index` is searched when the descriptor names no index.
pub fn translate(query: &str, default_index: &str) -> Result<Translation> {
    if !is_structured(query) {
        return Ok(Translation::FreeText);
    }

    let raw = parse_raw(query)?;
    let descriptor = QueryDescriptor::from_raw(&raw)?;
    let compiled = compile(&descriptor, default_index);
    Ok(Translation::Structured {
        raw,
        descriptor,
        compiled,
    })
}

/// Compile a descriptor into a backend query.
pub fn compile(descriptor: &QueryDescriptor, default_index: &str) -> CompiledQuery {
    let mut query = BoolQuery::default();

    if !descriptor.tags.is_empty() {
        query.filter.push(tags_filter(&descriptor.tags));
    }

    if let Some(filter) = paths_filter(&descriptor.paths) {
        query.filter.push(filter);
    }

    if let Some(text) = descriptor.search_text() {
        query.must.push(text_clause(text));
    }

    let targets = descriptor.resolved_indices(default_index);
    CompiledQuery {
        indices: targets.iter().map(|t| t.name.clone()).collect(),
        body: SearchBody {
            query: QueryClause { bool: query },
            indices_boost: targets,
            from: 0,
            size: PAGE_SIZE,
            source: SOURCE_FIELDS.iter().map(|f| f.to_string()).collect(),
        },
    }
}

/// Wildcard-wrapped `simple_query_string` over the boosted text fields.
pub fn text_clause(text: &str) -> Value {
    json!({
        "simple_query_string": {
            "query": format!("*{text}*"),
            "fields": TEXT_FIELDS,
            "default_operator": "and",
            "analyze_wildcard": true
        }
    })
}

fn tags_filter(tags: &[String]) -> Value {
    json!({ "terms": { TAGS_RAW_FIELD: tags } })
}

/// Prefix filter over `paths`, or `None` when it would not restrict anything.
fn paths_filter(paths: &[String]) -> Option<Value> {
    let mut prefixes = Vec::with_capacity(paths.len());
    for path in paths {
        let prefix = path_prefix(path);
        if prefix.is_empty() {
            return None;
        }
        prefixes.push(json!({ "prefix": { PATH_RAW_FIELD: prefix } }));
    }

    if prefixes.is_empty() {
        return None;
    }
    Some(json!({
        "bool": {
            "should": prefixes,
            "minimum_should_match": 1
        }
    }))
}

/// `"/docs/admin/*"` → `"docs/admin/"`.
fn path_prefix(path: &str) -> &str {
    path.trim().trim_start_matches('/').trim_end_matches('*')
}

// ============================================================================
// Tests
// ============================================================================
