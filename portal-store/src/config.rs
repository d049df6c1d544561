//! Store configuration.
//!
//! Connection settings for the Firestore REST surface, loaded from
//! environment variables once at first use. Credentials may arrive as an
//! inline service-account blob or as a path to a credential file; the inline
//! blob wins when both are set.

use std::time::Duration;

use serde::Deserialize;

use crate::error::StoreError;

/// Production Firestore REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

const DEFAULT_DATABASE_ID: &str = "(default)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Subset of a service-account credential file.
#[derive(Debug, Deserialize)]
struct ServiceAccount {
    project_id: String,
}

/// Connection settings for the incident store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Google Cloud project id.
    pub project_id: String,

    /// Database id within the project.
    pub database_id: String,

    /// REST endpoint base URL (override for the emulator and tests).
    pub base_url: String,

    /// Bearer token attached to every request, when configured.
    pub access_token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FIRESTORE_PROJECT_ID`: explicit project id (skips credential parsing)
    /// - `FIREBASE_SERVICE_ACCOUNT_JSON`: inline service-account JSON
    /// - `GOOGLE_APPLICATION_CREDENTIALS`: path to a service-account JSON file
    /// - `FIRESTORE_DATABASE_ID`: database id (default: `(default)`)
    /// - `FIRESTORE_BASE_URL`: REST endpoint override (emulator/tests)
    /// - `FIRESTORE_ACCESS_TOKEN`: bearer token for REST calls
    /// - `FIRESTORE_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self, StoreError> {
        let project_id = match non_empty_var("FIRESTORE_PROJECT_ID") {
            Some(id) => id,
            None => Self::project_from_credentials()?,
        };

        Ok(Self {
            project_id,
            database_id: non_empty_var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            base_url: non_empty_var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            access_token: non_empty_var("FIRESTORE_ACCESS_TOKEN"),
            timeout_secs: non_empty_var("FIRESTORE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Build a config for `project_id` with production defaults.
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    fn project_from_credentials() -> Result<String, StoreError> {
        if let Some(json) = non_empty_var("FIREBASE_SERVICE_ACCOUNT_JSON") {
            let account: ServiceAccount = serde_json::from_str(&json).map_err(|e| {
                StoreError::NotConfigured(format!("invalid FIREBASE_SERVICE_ACCOUNT_JSON: {}", e))
            })?;
            return Ok(account.project_id);
        }

        if let Some(path) = non_empty_var("GOOGLE_APPLICATION_CREDENTIALS") {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                StoreError::NotConfigured(format!("cannot read credential file {}: {}", path, e))
            })?;
            let account: ServiceAccount = serde_json::from_str(&contents).map_err(|e| {
                StoreError::NotConfigured(format!("invalid credential file {}: {}", path, e))
            })?;
            return Ok(account.project_id);
        }

        Err(StoreError::NotConfigured(
            "set FIRESTORE_PROJECT_ID, FIREBASE_SERVICE_ACCOUNT_JSON (stringified JSON), \
             or GOOGLE_APPLICATION_CREDENTIALS (path to a service account JSON file)"
                .to_string(),
        ))
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resource path of the documents root, without the endpoint host.
    pub fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
