//! Error types for the posts API suite
//!
//! Scenario failures are values in a report, not process errors. The
//! variants here cover what stops a single step (assertions, transport
//! failures) and what stops the whole run (configuration, unreadable files).

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the suite
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Invalid scenario file '{path}': {message}")]
    ScenarioParse { path: String, message: String },

    // === Fixture Errors ===
    #[error("Unsatisfiable fixture constraints: {0}")]
    Fixture(String),

    // === Transport Errors ===
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("{method} {path} returned status {status}. Set fail_on_status to false if this status is expected")]
    UnexpectedStatus {
        method: String,
        path: String,
        status: u16,
    },

    // === Scenario Errors ===
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error("Template variable '{0}' has not been captured by an earlier step")]
    MissingVariable(String),

    #[error("{failed} of {total} scenarios failed")]
    SuiteFailed { failed: usize, total: usize },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(method: &str, path: &str, status: u16) -> Self {
        Self::UnexpectedStatus {
            method: method.to_string(),
            path: path.to_string(),
            status,
        }
    }

    /// Whether the error came from the transport rather than from a check
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Timeout(_) | Error::UnexpectedStatus { .. } | Error::InvalidUrl { .. }
        )
    }
}
