//! # Portal Store
//!
//! Firestore-backed document store for the Incident Portal. This crate owns
//! the incident data model and the adapter between the tool/wire
//! representation of an incident and its persisted Firestore form.
//!
//! ## Overview
//!
//! The portal-store crate handles:
//! - **Model**: the `Incident` record and its enums, plus dual-shape input
//!   normalization (sequence or delimited string)
//! - **Codec**: typed Firestore field values and document conversion
//! - **Operations**: create, list, get, close, reopen, and generic partial
//!   update against the `incidents` collection
//! - **Configuration**: environment-driven connection settings
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portal_store::{NewIncident, Status};
//!
//! async fn example() -> Result<(), portal_store::StoreError> {
//!     let store = portal_store::shared_client()?;
//!
//!     let incident = store.create(NewIncident::default(), "triage-agent").await?;
//!     store.close(&incident.id).await?;
//!     store.reopen(&incident.id).await?;
//!
//!     let open = store.list(Some(Status::Open)).await?;
//!     println!("{} open incident(s)", open.len());
//!     Ok(())
//! }
//! ```
//!
//! There are no cross-document transactions and no retries; every operation
//! is an independent single-document read or write.

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod incident;

// Re-export main types
pub use client::FirestoreClient;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use incident::{
    ComplianceRisk, Incident, IncidentDraft, NewIncident, Severity, Status, StringOrList,
};

use std::sync::OnceLock;

/// Process-wide store handle.
static SHARED_CLIENT: OnceLock<FirestoreClient> = OnceLock::new();

/// Get the process-wide store client, building it from the environment on
/// first use.
///
/// The handle lives for the process lifetime and is safe for concurrent use;
/// each request issues independent single-document operations. Fails with
/// `StoreError::NotConfigured` when the environment names no project or
/// credentials.
pub fn shared_client() -> Result<&'static FirestoreClient, StoreError> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }
    let config = StoreConfig::from_env()?;
    Ok(SHARED_CLIENT.get_or_init(|| FirestoreClient::new(config)))
}
