//! Configuration for the Quarry search adapter.
//!
//! Configuration is read once at startup and shared read-only afterwards
//! (typically as `Arc<QuarryConfig>`). Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. A TOML file (explicit path, else `$QUARRY_CONFIG`)
//! 3. `QUARRY_*` environment overrides
//!
//! ```toml
//! [index]
//! index_name = "wiki"
//! stats_index_name = "wiki-search-stats"
//! analyzer = "simple"
//!
//! [backend]
//! hosts = "http://es-1:9200, http://es-2:9200"
//!
//! [stats]
//! enabled = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "QUARRY_CONFIG";

/// Content-index mapping used when none is configured.
pub const DEFAULT_MAPPINGS: &str = r#"{
  "properties": {
    "suggest": { "type": "completion" },
    "title": { "type": "text", "boost": 10.0 },
    "description": { "type": "text", "boost": 3.0 },
    "content": { "type": "text", "boost": 1.0 },
    "locale": { "type": "keyword" },
    "path": { "type": "text", "fields": { "kw": { "type": "keyword" } } },
    "tags": { "type": "text", "boost": 8.0, "fields": { "kw": { "type": "keyword" } } }
  }
}"#;

// ============================================================================
// Sections
// ============================================================================

/// Index names and mapping for the two managed indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Content index searched by default.
    pub index_name: String,
    /// Statistics index receiving one record per query.
    pub stats_index_name: String,
    /// Default analyzer type applied to both indices.
    pub analyzer: String,
    /// Content-index mapping, as JSON text.
    pub mappings: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_name: "wiki".to_string(),
            stats_index_name: "wiki-search-stats".to_string(),
            analyzer: "simple".to_string(),
            mappings: DEFAULT_MAPPINGS.to_string(),
        }
    }
}

impl IndexConfig {
    /// Parse the configured content mapping.
    ///
    /// The mapping must be a JSON object; anything else is a configuration
    /// error.
    pub fn content_mapping(&self) -> Result<Map<String, Value>> {
        let value: Value = serde_json::from_str(&self.mappings)
            .map_err(|e| Error::config(format!("invalid index mapping: {e}")))?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(Error::config(format!(
                "index mapping must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Connection settings for the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Comma-separated list of node URLs.
    pub hosts: String,
    /// Basic-auth user name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Client name sent as the `User-Agent`.
    pub client_name: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            hosts: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
            client_name: "quarry".to_string(),
        }
    }
}

impl BackendConfig {
    /// Node URLs, trimmed, with empty entries and trailing slashes dropped.
    pub fn nodes(&self) -> Vec<String> {
        self.hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| h.trim_end_matches('/').to_string())
            .collect()
    }
}

/// Search statistics recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Record one statistics document per query.
    pub enabled: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Settings for the built-in free-text search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Completion field used for suggestions; suggestions are off when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggest_field: Option<String>,
}

/// Process logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Emit ANSI colours.
    pub coloured: bool,
    /// Include the emitting module in each line.
    pub report_caller: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            coloured: true,
            report_caller: false,
        }
    }
}

// ============================================================================
// QuarryConfig
// ============================================================================

/// Top-level Quarry configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    /// Managed indices.
    pub index: IndexConfig,
    /// Backend connection.
    pub backend: BackendConfig,
    /// Statistics recording.
    pub stats: StatsConfig,
    /// Built-in free-text search.
    pub fallback: FallbackConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl QuarryConfig {
    /// Load configuration from a file, the environment, and defaults.
    ///
    /// `path` wins over `$QUARRY_CONFIG`; with neither, defaults are used.
    /// The result is validated before it is returned.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path
            .map(PathBuf::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                tracing::debug!(path = %path.display(), "Loaded configuration file");
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {e}")))
    }

    /// Apply `QUARRY_*` overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QUARRY_INDEX_NAME") {
            self.index.index_name = v;
        }
        if let Some(v) = lookup("QUARRY_STATS_INDEX_NAME") {
            self.index.stats_index_name = v;
        }
        if let Some(v) = lookup("QUARRY_ANALYZER") {
            self.index.analyzer = v;
        }
        if let Some(v) = lookup("QUARRY_HOSTS") {
            self.backend.hosts = v;
        }
    }

    /// Check the configuration for errors that must abort startup.
    pub fn validate(&self) -> Result<()> {
        if self.backend.nodes().is_empty() {
            return Err(Error::config("backend.hosts lists no nodes"));
        }
        if self.index.index_name.trim().is_empty() {
            return Err(Error::config("index.index_name must not be empty"));
        }
        if self.index.stats_index_name.trim().is_empty() {
            return Err(Error::config("index.stats_index_name must not be empty"));
        }
        if self.index.index_name == self.index.stats_index_name {
            return Err(Error::config(
                "index.index_name and index.stats_index_name must differ",
            ));
        }
        self.index.content_mapping()?;
        Ok(())
    }

    /// Export the effective configuration as `QUARRY_*` variable pairs.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        vec![
            ("QUARRY_INDEX_NAME".to_string(), self.index.index_name.clone()),
            (
                "QUARRY_STATS_INDEX_NAME".to_string(),
                self.index.stats_index_name.clone(),
            ),
            ("QUARRY_ANALYZER".to_string(), self.index.analyzer.clone()),
            ("QUARRY_HOSTS".to_string(), self.backend.nodes().join(",")),
        ]
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
