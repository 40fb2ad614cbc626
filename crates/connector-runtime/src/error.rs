//! Error types for connector-runtime

use connector_core::{ConnectorError, ErrorKind};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A failed prompt call, classified for retry decisions
#[derive(Error, Debug, Clone, Serialize)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status when a response was received
    pub status: Option<u16>,
    /// Parsed response body, if it was JSON
    pub raw: Option<Value>,
    /// Retries performed before giving up
    pub retries: u32,
    /// Latency of the last attempt
    pub latency_ms: u64,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            raw: None,
            retries: 0,
            latency_ms: 0,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_raw(mut self, raw: Option<Value>) -> Self {
        self.raw = raw;
        self
    }
}

/// Errors surfaced by the CLI and the scanner
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("Failed to load OpenAPI spec: {0}")]
    Spec(#[from] openapi_parser::ParseError),

    #[error("Request failed: {0}")]
    Call(#[from] RuntimeError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// Result type alias for CLI and scanner operations
pub type Result<T> = std::result::Result<T, AppError>;
