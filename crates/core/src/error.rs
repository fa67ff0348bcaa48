//! Unified error types for the folio offline router.
//!
//! Every variant renders as `CODE: detail` so log lines and tool errors carry
//! a stable prefix.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the router, its cache store and the host server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL or URL outside the router scope.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache entry found for the given request.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The network rejected the request (offline, DNS, connection reset).
    #[error("NETWORK_FAILED: {0}")]
    NetworkFailed(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// HTTP error response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Precaching the install manifest failed under the strict policy.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Lifecycle method called in the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),

    /// Route pattern could not be compiled.
    #[error("INVALID_ROUTE: {0}")]
    InvalidRoute(String),
}

impl Error {
    /// Whether this error came from the network side of a fetch.
    ///
    /// Strategies fall back to the cache only for these.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::NetworkFailed(_) | Error::FetchTimeout(_) | Error::HttpError(_))
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
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::NetworkFailed(msg) => (-32004, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::InstallFailed(msg) => (-32013, msg.clone()),
            Error::InvalidState(msg) => (-32014, msg.clone()),
            Error::InvalidRoute(msg) => (-32015, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
