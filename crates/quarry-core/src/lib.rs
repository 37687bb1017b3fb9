//! Quarry Core: shared types, configuration, errors, and logging setup.
//!
//! This crate provides the foundational types used across all Quarry crates.
//! It has no internal Quarry dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: Layered configuration (`QuarryConfig`)
//! - [`types`]: Search results, responses, and statistics records
//! - [`logging`]: `tracing` subscriber setup
//! - [`service`]: Provisioning readiness handle

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod types;

// Re-export key types at crate root for convenience
pub use config::{
    BackendConfig, FallbackConfig, IndexConfig, LoggingConfig, QuarryConfig, StatsConfig,
};
pub use error::{Error, Result};
pub use service::{ReadinessHandle, ReadinessState};
pub use types::{SearchOptions, SearchResponse, SearchResult, StatExtra, StatRecord, StatUser};
