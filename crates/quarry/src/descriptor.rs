//! Structured query descriptor.
//!
//! A structured query is the sentinel `#PWTJSON#:` followed by JSON:
//!
//! ```json
//! {
//!   "q": "setup guide",
//!   "tags": ["howto"],
//!   "paths": ["admin/*"],
//!   "index": { "wiki": { "boost": 2 }, "kb": { "boost": 1 } }
//! }
//! ```
//!
//! Every key is optional. The order of the `index` object is kept, since it
//! decides the order of the backend index list and boost list.
//!
//! Index names must be non-empty, must not be `.` or `..` and must not
//! contain a comma. A path may end in `*`; a `*` anywhere else is rejected,
//! since paths filter by literal prefix.

use std::fmt;

use quarry_core::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Prefix that marks a query as structured.
pub const STRUCTURED_PREFIX: &str = "#PWTJSON#";

/// Prefix plus delimiter stripped before the JSON payload.
pub const STRUCTURED_SENTINEL: &str = "#PWTJSON#:";

/// Boost applied to the default index when the descriptor names none.
pub const DEFAULT_INDEX_BOOST: f64 = 2.0;

/// Whether `query` is a structured query.
pub fn is_structured(query: &str) -> bool {
    query.starts_with(STRUCTURED_PREFIX)
}

/// A target index and its relevance multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBoost {
    /// Index name.
    pub name: String,
    /// Score multiplier for hits from this index.
    pub boost: f64,
}

impl IndexBoost {
    /// Create a target.
    pub fn new(name: impl Into<String>, boost: f64) -> Self {
        Self {
            name: name.into(),
            boost,
        }
    }
}

/// Serializes as the backend's single-entry `{ "<index>": <boost> }` form.
impl Serialize for IndexBoost {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.boost)?;
        map.end()
    }
}

/// Parsed structured query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Free text matched against the boosted text fields.
    #[serde(rename = "q", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Tags; a hit must carry at least one of them.
    #[serde(default, deserialize_with = "nullable_list")]
    pub tags: Vec<String>,

    /// Path prefixes; a hit must live under at least one of them.
    #[serde(default, deserialize_with = "nullable_list")]
    pub paths: Vec<String>,

    /// Target indices with boosts, in request order.
    #[serde(
        rename = "index",
        default,
        skip_serializing_if = "Option::is_none",
        with = "index_map"
    )]
    pub indices: Option<Vec<IndexBoost>>,
}

impl QueryDescriptor {
    /// Parse a structured query string.
    ///
    /// The `#PWTJSON#:` sentinel is stripped when present; the rest must be
    /// a JSON object. Anything else is a [`Error::Translation`].
    pub fn parse(query: &str) -> Result<Self> {
        Self::from_raw(&parse_raw(query)?)
    }

    /// Build a descriptor from an already parsed JSON payload.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let descriptor = Self::deserialize(raw)
            .map_err(|e| Error::translation(format!("invalid structured query: {e}")))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<()> {
        for target in self.indices.iter().flatten() {
            let name = target.name.as_str();
            if name.is_empty() || name == "." || name == ".." || name.contains(',') {
                return Err(Error::translation(format!("invalid index name '{name}'")));
            }
        }
        for path in &self.paths {
            if path.trim().trim_end_matches('*').contains('*') {
                return Err(Error::translation(format!(
                    "path '{path}' has a wildcard before its end"
                )));
            }
        }
        Ok(())
    }

    /// Text to search for, if any non-empty text was given.
    pub fn search_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Target indices, falling back to `default_index` with boost 2.
    ///
    /// An empty `index` object counts as absent.
    pub fn resolved_indices(&self, default_index: &str) -> Vec<IndexBoost> {
        match &self.indices {
            Some(indices) if !indices.is_empty() => indices.clone(),
            _ => vec![IndexBoost::new(default_index, DEFAULT_INDEX_BOOST)],
        }
    }
}

/// JSON payload of a structured query, exactly as the caller sent it.
///
/// The `#PWTJSON#:` sentinel is stripped when present. Key order is kept.
pub fn parse_raw(query: &str) -> Result<Value> {
    let payload = query.strip_prefix(STRUCTURED_SENTINEL).unwrap_or(query);
    serde_json::from_str(payload)
        .map_err(|e| Error::translation(format!("invalid structured query: {e}")))
}

fn nullable_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Order-preserving (de)serialization of the `index` object.
mod index_map {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct IndexOptions {
        #[serde(default = "default_boost")]
        boost: f64,
    }

    fn default_boost() -> f64 {
        1.0
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<IndexBoost>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(indices) => {
                let mut map = serializer.serialize_map(Some(indices.len()))?;
                for target in indices {
                    map.serialize_entry(&target.name, &IndexOptions { boost: target.boost })?;
                }
                map.end()
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Vec<IndexBoost>>, D::Error> {
        deserializer.deserialize_option(OptionalIndexMap)
    }

    struct OptionalIndexMap;

    impl<'de> Visitor<'de> for OptionalIndexMap {
        type Value = Option<Vec<IndexBoost>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping index names to { boost }")
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> std::result::Result<Self::Value, D::Error> {
            deserializer.deserialize_map(IndexMap).map(Some)
        }
    }

    struct IndexMap;

    impl<'de> Visitor<'de> for IndexMap {
        type Value = Vec<IndexBoost>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping index names to { boost }")
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut access: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut indices: Vec<IndexBoost> = Vec::new();
            while let Some((name, options)) = access.next_entry::<String, IndexOptions>()? {
                // Repeated keys keep their first position and last value.
                match indices.iter_mut().find(|t| t.name == name) {
                    Some(existing) => existing.boost = options.boost,
                    None => indices.push(IndexBoost::new(name, options.boost)),
                }
            }
            Ok(indices)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
