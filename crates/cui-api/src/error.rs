//! Error types for cui-api

use thiserror::Error;

/// Result type alias using cui-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of failures, as surfaced to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fetch failed, timed out, or the backend answered with a server error
    Network,
    /// Request rejected for credentials
    Authentication,
    /// The live event channel dropped
    StreamConnection,
    /// Malformed filter, cursor or payload
    Validation,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Authentication => "authentication",
            ErrorKind::StreamConnection => "stream",
            ErrorKind::Validation => "validation",
        }
    }
}

/// Errors that can occur when talking to the cui backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level failure that did not come from reqwest
    #[error("Network error: {0}")]
    Network(String),

    /// Backend rejected the auth token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Backend returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Event stream dropped or could not be opened
    #[error("Stream connection error: {0}")]
    StreamConnection(String),

    /// Malformed filter or cursor
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Map this error onto the console's error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(e) if e.status().is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403) => {
                ErrorKind::Authentication
            }
            Error::Http(_) | Error::Network(_) => ErrorKind::Network,
            Error::Api { status, .. } if *status == 401 || *status == 403 => {
                ErrorKind::Authentication
            }
            Error::Api { status, .. } if *status == 400 || *status == 422 => ErrorKind::Validation,
            Error::Api { .. } => ErrorKind::Network,
            Error::Auth(_) => ErrorKind::Authentication,
            Error::StreamConnection(_) => ErrorKind::StreamConnection,
            Error::Json(_) | Error::Validation(_) | Error::InvalidConfig(_) => {
                ErrorKind::Validation
            }
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Network(_) | Error::StreamConnection(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
