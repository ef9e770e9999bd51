//! Error types for the triage pipeline.
//!
//! Only the seams that can genuinely fail get an error type. Detection,
//! correlation, prompt construction and response parsing are total.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from a completion backend call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Completion is switched off in configuration
    #[error("completion backend is disabled")]
    Disabled,

    /// API key environment variable is not set
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("completion backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("malformed completion response: {0}")]
    Malformed(String),

    /// Response decoded but carried no text
    #[error("completion response contained no text")]
    EmptyResponse,
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Errors loading a snapshot document.
///
/// Individual malformed resources inside a readable document are not errors;
/// they become `Unknown` faults.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshots from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
