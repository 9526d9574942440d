//! Unified error types for shellcache.
//!
//! Every variant carries a stable code prefix so hosts can map failures
//! without matching on message text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the caching agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown HTTP method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The build manifest is malformed or inconsistent.
    #[error("INVALID_MANIFEST: {0}")]
    InvalidManifest(String),

    /// The configured origin cannot serve as a cache scope.
    #[error("INVALID_ORIGIN: {0}")]
    InvalidOrigin(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Storage backend rejected an operation.
    #[error("CACHE_ERROR: {0}")]
    Storage(String),

    /// Transport-level failure: no response was received.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// A response arrived but its status is not successful.
    #[error("HTTP_ERROR: {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// A core shell resource could not be staged.
    #[error("INSTALL_FAILED: {path}: {reason}")]
    InstallFailed { path: String, reason: String },

    /// Lifecycle operation attempted from the wrong generation state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// JSON (de)serialization failed.
    #[error("SERIALIZATION: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for failures where no response reached the caller.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InvalidManifest(_) => -32000,
            Error::InvalidOrigin(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Storage(_) => -32002,
            Error::Network(_) => -32003,
            Error::FetchTooLarge(_) => -32004,
            Error::HttpStatus { .. } => -32005,
            Error::InstallFailed { .. } => -32006,
            Error::InvalidState(_) => -32007,
            Error::Serialization(_) => -32008,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailed { path: "main.dart.js".to_string(), reason: "offline".to_string() };
        assert!(err.to_string().contains("INSTALL_FAILED"));
        assert!(err.to_string().contains("main.dart.js"));
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus { url: "https://app.example/x".to_string(), status: 404 };
        assert_eq!(err.to_string(), "HTTP_ERROR: https://app.example/x returned status 404");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidState("not installed".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32007);
    }

    #[test]
    fn test_is_network() {
        assert!(Error::Network("reset".into()).is_network());
        assert!(!Error::HttpStatus { url: String::new(), status: 500 }.is_network());
    }
}
