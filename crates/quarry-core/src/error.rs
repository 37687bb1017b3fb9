//! Error types for Quarry.

use std::path::{Path, PathBuf};

/// Errors that can occur while provisioning indices or answering searches.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or unusable configuration (malformed mapping, empty hosts, ...).
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// The structured query payload could not be parsed.
    #[error("Translation error: {message}")]
    Translation {
        /// Parser message
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("Backend error (HTTP {status}): {message}")]
    Backend {
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The backend could not be reached at all.
    #[error("Backend unavailable: {message}")]
    Unavailable {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Writing a statistics record failed.
    ///
    /// Only ever logged; the search path never returns it.
    #[error("Statistics write failed: {message}")]
    StatsWrite {
        /// Underlying failure
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error with the offending path
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Convenience `Result` type alias for Quarry operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new translation error.
    pub fn translation<S: Into<String>>(message: S) -> Self {
        Error::Translation {
            message: message.into(),
        }
    }

    /// Creates a backend error from a status code and response body.
    pub fn backend<S: Into<String>>(status: u16, message: S) -> Self {
        Error::Backend {
            status,
            message: message.into(),
        }
    }

    /// Creates an unavailable-backend error without a source.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Error::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unavailable-backend error wrapping the transport failure.
    pub fn unavailable_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps any error raised on the statistics side channel.
    pub fn stats_write(source: &Error) -> Self {
        Error::StatsWrite {
            message: source.to_string(),
        }
    }

    /// Creates an I/O error tagged with the path involved.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns whether this error came from talking to the search backend.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Error::Backend { .. } | Error::Unavailable { .. } | Error::StatsWrite { .. }
        )
    }

    /// Returns whether this error is worth retrying by the host.
    ///
    /// Quarry itself never retries; hosts may.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Unavailable { .. } => true,
            Error::Backend { status, .. } => *status == 429 || *status >= 500,
            Error::StatsWrite { .. } => true,
            Error::Config { .. } => false,
            Error::Translation { .. } => false,
            Error::Json(_) => false,
            Error::Io { .. } => false,
        }
    }
}
