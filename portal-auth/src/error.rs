//! Error types for endpoint authentication.

use thiserror::Error;

/// Authentication error types.
///
/// The endpoint distinguishes a service that is missing its secret from a
/// caller presenting the wrong one: the former is a deployment fault, the
/// latter a caller fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The endpoint has no secret configured.
    #[error(
        "MCP auth not configured. Set MCP_AUTH_SECRET in the environment and send \
         Authorization: Bearer <secret> or X-API-Key: <secret>."
    )]
    NotConfigured,

    /// The caller's credential is missing or does not match.
    #[error("Unauthorized. Send Authorization: Bearer <secret> or X-API-Key: <secret>.")]
    Unauthorized,
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// A missing secret is a deployment problem; a bad credential is
    /// expected caller behavior.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::NotConfigured)
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::NotConfigured => 503,
            AuthError::Unauthorized => 401,
        }
    }

    /// Get JSON-RPC error code for this error.
    pub fn rpc_code(&self) -> i32 {
        match self {
            AuthError::NotConfigured => -32000,
            AuthError::Unauthorized => -32001,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotConfigured => "AUTH_NOT_CONFIGURED",
            AuthError::Unauthorized => "UNAUTHORIZED",
        }
    }
}
