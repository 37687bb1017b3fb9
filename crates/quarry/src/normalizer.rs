//! Raw backend response → [`SearchResponse`].
//!
//! Extraction is lenient: missing or mistyped fields become `None`/empty and
//! never fail the search.

use quarry_core::{SearchResponse, SearchResult};
use serde_json::Value;

/// Normalize a raw search response. Suggestions are left empty.
pub fn normalize(raw: &Value) -> SearchResponse {
    let results = raw
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| hits.iter().map(normalize_hit).collect())
        .unwrap_or_default();

    SearchResponse {
        results,
        suggestions: Vec::new(),
        total_hits: total_hits(raw),
    }
}

/// Map one hit to a [`SearchResult`].
pub fn normalize_hit(hit: &Value) -> SearchResult {
    let source = hit.get("_source");
    let text = |field: &str| {
        source
            .and_then(|s| s.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    SearchResult {
        id: match hit.get("_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        locale: text("locale"),
        path: text("path"),
        title: text("title"),
        description: text("description"),
        tags: source
            .and_then(|s| s.get("tags"))
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        score: hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0),
    }
}

/// Total hit count.
///
/// Elasticsearch 7+ reports `hits.total` as `{ "value": n }`; older versions
/// report a bare integer.
pub fn total_hits(raw: &Value) -> u64 {
    raw.pointer("/hits/total/value")
        .and_then(Value::as_u64)
        .or_else(|| raw.pointer("/hits/total").and_then(Value::as_u64))
        .unwrap_or(0)
}

/// First option text of every completion suggestion entry.
pub fn suggestions(raw: &Value) -> Vec<String> {
    raw.pointer("/suggest/suggestions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.pointer("/options/0/text").and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
