//! Error types for storyboard-export
//!
//! Per-asset fetch problems never surface here — they are converted into
//! [`FailureRecord`](crate::types::FailureRecord) values and aggregated into the
//! export result. This module covers the failures that legitimately abort an
//! export: archive assembly, manifest serialization, and I/O on the archive
//! writer itself.

use thiserror::Error;

/// Result type alias for storyboard-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for storyboard-export
#[derive(Debug, Error)]
pub enum Error {
    /// Network error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error while assembling the archive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive assembly failed — fatal, since a partial archive without a
    /// consistent manifest is not a meaningful result
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Manifest serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The generation-task collaborator could not be queried
    #[error("task source error: {0}")]
    TaskSource(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}
