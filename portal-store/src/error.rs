//! Error types for incident store operations.

use thiserror::Error;

/// Incident store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store connection is not configured.
    #[error("Store not configured: {0}")]
    NotConfigured(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Firestore rejected the configured credentials.
    #[error("Store authentication failed")]
    PermissionDenied,

    /// Incident document does not exist.
    #[error("Incident not found: {0}")]
    NotFound(String),

    /// API returned an error response.
    #[error("Store API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Whether this error names a missing document rather than a store fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
