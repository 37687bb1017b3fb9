//! Search backend client facade for Quarry.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                quarry-elastic                │
//! ├──────────────────────────────────────────────┤
//! │  SearchClient trait                          │
//! │  ├── HttpSearchClient (Elasticsearch REST)   │
//! │  └── MockSearchClient (`mock` feature)       │
//! ├──────────────────────────────────────────────┤
//! │  IndexSettings (mapping + default analyzer)  │
//! │  Refresh (write visibility policy)           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_core::BackendConfig;
//! use quarry_elastic::{HttpSearchClient, SearchClient};
//!
//! let client = HttpSearchClient::new(&BackendConfig::default())?;
//! if !client.index_exists("wiki").await? {
//!     // create it
//! }
//! ```

#![forbid(unsafe_code)]

pub mod client;
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{IndexSettings, Refresh, SearchClient};
pub use http::HttpSearchClient;

#[cfg(any(test, feature = "mock"))]
pub use mock::{Call, MockSearchClient};
