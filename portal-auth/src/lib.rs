//! # Portal Auth
//!
//! Shared-secret authentication for the Incident Portal MCP endpoint.
//!
//! ## Overview
//!
//! Every request to the protocol endpoint must present a single
//! process-wide secret, via either of two headers:
//!
//! - `Authorization: Bearer <secret>`
//! - `X-API-Key: <secret>`
//!
//! The secret is compared by exact match after trimming whitespace. An
//! endpoint with no secret configured reports a distinct
//! "service not configured" fault rather than blaming the caller.
//!
//! ## Usage
//!
//! ```rust
//! use portal_auth::{authorize, AuthError, AuthSecret};
//!
//! let secret = AuthSecret::new("s3cret");
//!
//! assert!(authorize(secret.as_ref(), Some("Bearer s3cret"), None).is_ok());
//! assert_eq!(
//!     authorize(secret.as_ref(), None, Some("wrong")),
//!     Err(AuthError::Unauthorized)
//! );
//! assert_eq!(
//!     authorize(None, Some("Bearer s3cret"), None),
//!     Err(AuthError::NotConfigured)
//! );
//! ```

pub mod error;

pub use error::{AuthError, AuthResult};

/// Environment variable holding the endpoint secret.
pub const SECRET_ENV_VAR: &str = "MCP_AUTH_SECRET";

/// The configured endpoint secret.
///
/// Construction trims the value; a secret that is empty after trimming
/// counts as unconfigured and never constructs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSecret(String);

impl AuthSecret {
    /// Build a secret from a configured value. Returns `None` when the value
    /// is empty after trimming.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Read the secret from `MCP_AUTH_SECRET`, once at process start.
    pub fn from_env() -> Option<Self> {
        std::env::var(SECRET_ENV_VAR).ok().and_then(Self::new)
    }

    /// Verify a caller-supplied credential against this secret.
    pub fn verify(&self, credential: Option<&str>) -> AuthResult<()> {
        match credential {
            Some(token) if token.trim() == self.0 => Ok(()),
            _ => Err(AuthError::Unauthorized),
        }
    }
}

impl std::fmt::Debug for AuthSecret {
    // Never print the secret itself.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthSecret(..)")
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(|t| t.trim())
}

/// Authenticate a request from its auth headers.
///
/// `authorization` is the raw `Authorization` header, `api_key` the raw
/// `X-API-Key` header; a bearer credential wins when both are present. With
/// no secret configured, every request fails with `NotConfigured` no matter
/// what the caller sent.
pub fn authorize(
    secret: Option<&AuthSecret>,
    authorization: Option<&str>,
    api_key: Option<&str>,
) -> AuthResult<()> {
    let secret = secret.ok_or(AuthError::NotConfigured)?;
    let credential = authorization.and_then(bearer_token).or(api_key);
    secret.verify(credential)
}
