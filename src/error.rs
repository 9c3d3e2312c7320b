//! Error types for the cache and its transport
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Transport Error Enum ==
/// Failure of a call to the remote API.
///
/// The cache never wraps or rewrites these: whatever the transport returns is
/// what the caller sees, cached or not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, reset, ...
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the transport timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The HTTP client could not be built or the request could not be formed
    #[error("Client error: {0}")]
    Client(String),
}

impl TransportError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// == Storage Error Enum ==
/// Failure of the durable cache tier.
///
/// Recovered locally by the cache store; never surfaced to API callers.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying file I/O failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialized for storage
    #[error("Serialization failed: {0}")]
    Serialize(String),

    /// A stored record could not be parsed
    #[error("Corrupt entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// The write would exceed the storage quota
    #[error("Quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
    QuotaExceeded { needed: usize, limit: usize },
}

// == Result Type Alias ==
/// Convenience Result type for durable storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
