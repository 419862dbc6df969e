//! Errors shared by the ports.

use thiserror::Error;

/// Errors surfaced by backend ports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected bearer token (HTTP 401/403)
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Request refused by the backend (other 4xx)
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Backend failure (5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Connection could not be established or was dropped
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    /// Body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local file could not be read for upload
    #[error("Failed to read {path}: {message}")]
    FileRead { path: String, message: String },
}

impl ApiError {
    /// Returns true if the same request may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Server { .. } | ApiError::Network(_) | ApiError::Timeout
        )
    }
}

/// Local persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Network("reset".to_string()).is_transient());
        assert!(ApiError::Server {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!ApiError::Unauthorized("expired".to_string()).is_transient());
        assert!(!ApiError::Rejected {
            status: 400,
            message: "bad".to_string()
        }
        .is_transient());
        assert!(!ApiError::InvalidResponse("not json".to_string()).is_transient());
    }
}
