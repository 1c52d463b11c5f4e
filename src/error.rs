//! Error types for rfapi
//!
//! This module defines the error hierarchy for the whole client.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use serde_json::Value;
use thiserror::Error;

/// The main error type for rfapi
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("No Recorded Future API key or authentication method was provided")]
    MissingAuth,

    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication {
        status: u16,
        message: String,
        body: String,
    },

    // ============================================================================
    // Server Errors
    // ============================================================================
    #[error("Server failure: code={code:?} message={message}")]
    RemoteServer { code: Option<Value>, message: String },

    #[error("HTTP {status}: {message}")]
    HttpError {
        status: u16,
        message: String,
        body: String,
    },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Could not parse response as JSON (HTTP {status}): {message}")]
    JsonParse {
        status: u16,
        message: String,
        body: String,
    },

    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String, query: Value },

    #[error("Unable to page query. {message}")]
    UnknownQueryType { message: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid query error carrying the offending query
    pub fn invalid_query(message: impl Into<String>, query: Value) -> Self {
        Self::InvalidQuery {
            message: message.into(),
            query,
        }
    }

    /// Create an unknown query type error
    pub fn unknown_query_type(message: impl Into<String>) -> Self {
        Self::UnknownQueryType {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a remote server error from an in-body failure
    pub fn remote_server(code: Option<Value>, message: impl Into<String>) -> Self {
        Self::RemoteServer {
            code,
            message: message.into(),
        }
    }

    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. }
            | Error::HttpError { status, .. }
            | Error::HttpStatus { status, .. }
            | Error::JsonParse { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body attached to this error, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Authentication { body, .. }
            | Error::HttpError { body, .. }
            | Error::HttpStatus { body, .. }
            | Error::JsonParse { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Http(e) => e.is_timeout(),
            Error::HttpError { status, .. } | Error::HttpStatus { status, .. } => {
                is_retryable_status(*status)
            }
            _ => false,
        }
    }
}

/// Gateway errors are the only statuses worth resending
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 502 | 503)
}

/// Result type alias for rfapi
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
