//! Error types for RecordKV
//!
//! Provides a unified error type for all client operations.
//!
//! Record absence is never an error: `get` returns `None`, `exists` and
//! `delete` return `false`.

use thiserror::Error;

use crate::protocol::ResultCode;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for RecordKV client operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session is closed")]
    ConnectionClosed,

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({code:?}): {message}")]
    Server { code: ResultCode, message: String },

    #[error("Bin type mismatch: {0}")]
    TypeMismatch(String),

    // -------------------------------------------------------------------------
    // Caller Errors (detected before any I/O)
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// True when the connection that produced this error must not be reused
    pub fn poisons_connection(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout(_) | ClientError::Network(_) | ClientError::Protocol(_)
        )
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            // Unix reports socket timeouts as WouldBlock, Windows as TimedOut
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                ClientError::Timeout(err.to_string())
            }
            _ => ClientError::Network(err.to_string()),
        }
    }
}

impl From<bincode::Error> for ClientError {
    fn from(err: bincode::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}
