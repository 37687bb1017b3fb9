//! Quarry: a search-query adapter for a document search backend.
//!
//! Quarry accepts either free text or a structured query descriptor,
//! compiles structured queries into a backend boolean query with field and
//! per-index boosting, runs them, and records one statistics document per
//! search. It also provisions the content and statistics indices.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   │  search(query, options)
//!   ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │ SearchEngine                                              │
//! │  translate ──► Structured ──► SearchClient ──► normalize  │
//! │      │                                                    │
//! │      └──────► FreeText ────► FallbackSearch               │
//! │                                                           │
//! │  StatsRecorder (detached write to the statistics index)   │
//! ├───────────────────────────────────────────────────────────┤
//! │ IndexProvisioner (content + statistics index, joined)     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Structured queries
//!
//! | Key | Effect |
//! |-----|--------|
//! | `q` | `*q*` over `title^20`, `description^3`, `tags^8`, `content^1` |
//! | `tags` | documents carrying any of the tags |
//! | `paths` | documents under any of the path prefixes |
//! | `index` | target indices and their boosts (default `{wiki: 2}`) |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quarry::{QuarryConfig, SearchEngine, SearchOptions};
//!
//! let config = Arc::new(QuarryConfig::load(None)?);
//! quarry::logging::init(&config.logging);
//!
//! let engine = SearchEngine::connect(config)?;
//! engine.provision().await?;
//!
//! let response = engine
//!     .search(
//!         r#"#PWTJSON#:{"q":"setup guide","tags":["howto"]}"#,
//!         &SearchOptions::for_user("alice@example.com"),
//!     )
//!     .await?;
//! ```

#![forbid(unsafe_code)]

pub mod descriptor;
pub mod engine;
pub mod fallback;
pub mod normalizer;
pub mod provisioner;
pub mod stats;
pub mod translator;

mod proptests;

pub use descriptor::{IndexBoost, QueryDescriptor, STRUCTURED_SENTINEL};
pub use engine::SearchEngine;
pub use fallback::{ElasticFallback, FallbackSearch};
pub use provisioner::{IndexOutcome, IndexProvisioner, ProvisionReport};
pub use stats::StatsRecorder;
pub use translator::{CompiledQuery, Translation, compile, translate};

// Re-export the shared types so hosts only need this crate.
pub use quarry_core::{
    Error, QuarryConfig, ReadinessHandle, ReadinessState, Result, SearchOptions, SearchResponse,
    SearchResult, logging,
};
pub use quarry_elastic::{HttpSearchClient, SearchClient};
