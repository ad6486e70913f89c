//! Service Layer Error Types
//!
//! Errors of the model manager and of the fetch adapters it drives.

use crate::db::StoreError;
use thiserror::Error;

/// Failure of a model fetch
///
/// `Clone` so that one pending fetch can hand the same outcome to every
/// caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-2xx status
    #[error("Model request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// The request never produced a response
    #[error("Model request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The response body is not a JSON model
    #[error("Invalid model response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// No request target could be built
    #[error("Invalid model url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Create a status error
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(url: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status of the failure, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Model manager errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelManagerError {
    /// Remote fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Store mutation failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// No path could be resolved for the request
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No model is available at the path after loading
    #[error("No model data at {0}")]
    NotFound(String),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ModelManagerError {
    /// Create an invalid path error
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a not found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }
}
