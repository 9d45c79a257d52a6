//! Error types for misp-ioc-export
//!
//! This module provides the error taxonomy for the exporter:
//! - [`Error`] for failures that abort an export run (configuration, client setup, sink)
//! - [`FetchError`] for a single page that could not be retrieved; the pagination
//!   engine logs these and keeps going
//! - Machine-readable error codes for structured log fields

use std::path::PathBuf;
use thiserror::Error;

use crate::types::PageIndex;

/// Result type alias for misp-ioc-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for misp-ioc-export
///
/// Each variant carries enough context to tell the operator which setting,
/// file or page was involved.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "batch_size")
        key: Option<String>,
    },

    /// Network error while building or using the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The output destination could not be written; fatal to the run
    #[error("failed to write {}: {source}", path.display())]
    Sink {
        /// Destination that rejected the write
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, used as a structured logging field
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Sink { .. } => "sink_error",
        }
    }
}

/// A single page could not be retrieved from the remote API
#[derive(Debug, Error)]
#[error("page {page}: {kind}")]
pub struct FetchError {
    /// Page that failed
    pub page: PageIndex,
    /// Why it failed
    pub kind: FetchErrorKind,
}

impl FetchError {
    /// Create a new fetch error for `page`
    pub fn new(page: PageIndex, kind: FetchErrorKind) -> Self {
        Self { page, kind }
    }
}

/// Classification of page fetch failures
#[derive(Debug, Error)]
pub enum FetchErrorKind {
    /// Connection, TLS or timeout failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("server returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// The response body was not valid JSON
    #[error("undecodable response: {0}")]
    Decode(String),

    /// The fetch task ended without producing a result (panic or abort)
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

impl FetchErrorKind {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchErrorKind::Transport(_) => "fetch_transport",
            FetchErrorKind::Status { .. } => "fetch_status",
            FetchErrorKind::Decode(_) => "fetch_decode",
            FetchErrorKind::TaskFailed(_) => "fetch_task_failed",
        }
    }
}

impl From<reqwest::Error> for FetchErrorKind {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchErrorKind::Decode(e.to_string())
        } else if e.is_timeout() {
            FetchErrorKind::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            FetchErrorKind::Transport(format!("connection failed: {e}"))
        } else {
            FetchErrorKind::Transport(e.to_string())
        }
    }
}
