//! Error types for flow-run-export
//!
//! Two layers of failure exist in the export pipeline:
//! - [`GatewayError`]: a single fetch (one run's steps, one step's inputs or outputs)
//!   failed. These are absorbed by the aggregator and turned into data.
//! - [`Error`]: the export as a whole cannot complete (no runs, serialization failed,
//!   invalid configuration). These are surfaced to the caller as one terminal error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flow-run-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for flow-run-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "content_concurrency")
        key: Option<String>,
    },

    /// Export was requested without any runs
    #[error("no runs to export")]
    NoRuns,

    /// A direct gateway call failed (only raised outside the aggregator)
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Writing the spreadsheet container failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The assembled report broke one of its own invariants
    #[error("report assembly failed: {0}")]
    Assembly(String),

    /// The target file already exists and the collision action forbids replacing it
    #[error("file already exists: {}", path.display())]
    Collision {
        /// The path that already exists
        path: PathBuf,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NoRuns => "no_runs",
            Error::Gateway(e) => e.error_code(),
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
            Error::Assembly(_) => "assembly_error",
            Error::Collision { .. } => "file_collision",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Failure of a single request made through a [`FetchGateway`](crate::gateway::FetchGateway)
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service rejected the access token
    #[error("unauthorized: access token rejected or expired")]
    Unauthorized,

    /// The service answered with a non-success status
    #[error("service returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request did not finish within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The response body was not the expected JSON document
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A field the pipeline depends on was absent from the response
    #[error("response is missing field `{0}`")]
    MissingField(String),

    /// The content locator could not be turned into a request URL
    #[error("invalid locator {locator}: {reason}")]
    InvalidLocator {
        /// The locator as received
        locator: String,
        /// Why it was rejected
        reason: String,
    },
}

impl GatewayError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::Status { .. } => "http_status",
            GatewayError::Network(_) => "network_error",
            GatewayError::Timeout => "timeout",
            GatewayError::Decode(_) => "invalid_response",
            GatewayError::MissingField(_) => "missing_field",
            GatewayError::InvalidLocator { .. } => "invalid_locator",
        }
    }
}
