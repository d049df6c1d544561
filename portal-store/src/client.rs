//! Firestore REST client for the incidents collection.
//!
//! Performs the four document operations (create, list, get, update-status)
//! against a single flat collection. Writes that need server-assigned times
//! go through `commit` with a `REQUEST_TIME` transform, the same way the
//! Admin SDK stamps server timestamps. No retries: a transient store failure
//! is reported to the caller, who retries at the protocol level.

use std::collections::BTreeMap;

use reqwest::{Client, Method, StatusCode};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::convert::{
    self, CommitRequest, CommitResponse, Document, DocumentMask, FieldTransform, FieldValue,
    Precondition, RunQueryEntry, Write,
};
use crate::error::StoreError;
use crate::incident::{Incident, NewIncident, Status};

/// Name of the incident collection.
const COLLECTION: &str = "incidents";

/// Firestore-backed incident store.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    /// HTTP client instance.
    client: Client,

    /// Connection settings.
    config: StoreConfig,
}

impl FirestoreClient {
    /// Create a new store client.
    pub fn new(config: StoreConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Create an incident document.
    ///
    /// Normalizes the dual-shape list fields, applies field defaults, stamps
    /// `created_at` with the store's request time, and returns the persisted
    /// incident including its assigned id.
    #[instrument(skip(self, payload), fields(incident_id = %payload.incident_id))]
    pub async fn create(
        &self,
        payload: NewIncident,
        created_by: &str,
    ) -> Result<Incident, StoreError> {
        let draft = payload.into_draft(created_by);
        let id = Uuid::now_v7().simple().to_string();
        debug!("Creating incident document {}", id);

        let write = Write {
            update: Document {
                name: Some(self.document_name(&id)),
                fields: convert::draft_fields(&draft),
                ..Default::default()
            },
            update_mask: None,
            update_transforms: vec![FieldTransform::request_time("created_at")],
            current_document: Some(Precondition {
                exists: Some(false),
            }),
        };
        self.commit(write, &id).await?;

        // Read back for the server-stamped created_at.
        self.get(&id).await?.ok_or_else(|| {
            StoreError::InvalidResponse(format!("document {} missing after create", id))
        })
    }

    /// List incidents ordered by `created_at` descending.
    ///
    /// The ordering is store-side; the optional status filter is applied
    /// client-side, with documents missing a status treated as OPEN.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<Status>) -> Result<Vec<Incident>, StoreError> {
        let body = serde_json::json!({
            "structuredQuery": {
                "from": [{"collectionId": COLLECTION}],
                "orderBy": [
                    {"field": {"fieldPath": "created_at"}, "direction": "DESCENDING"}
                ]
            }
        });

        let url = self.documents_url(":runQuery");
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let entries: Vec<RunQueryEntry> = self.handle_response(response).await?;

        let mut incidents = Vec::new();
        for entry in entries {
            if let Some(document) = entry.document {
                incidents.push(convert::incident_from_document(&document)?);
            }
        }

        if let Some(status) = status {
            incidents.retain(|incident| incident.status == status);
        }

        Ok(incidents)
    }

    /// Fetch a single incident by document id.
    ///
    /// Returns `None` when the id is unknown.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Incident>, StoreError> {
        let url = self.documents_url(&format!("/{}/{}", COLLECTION, id));
        let response = self.request(Method::GET, &url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Document = self.handle_response(response).await?;
        convert::incident_from_document(&document).map(Some)
    }

    /// Apply a partial update to an existing incident.
    ///
    /// A field named in `mask` but absent from `fields` is deleted from the
    /// document. Fails with `NotFound` when the id is unknown.
    pub async fn update(
        &self,
        id: &str,
        fields: BTreeMap<String, FieldValue>,
        mask: &[&str],
        transforms: Vec<FieldTransform>,
    ) -> Result<(), StoreError> {
        let write = Write {
            update: Document {
                name: Some(self.document_name(id)),
                fields,
                ..Default::default()
            },
            update_mask: Some(DocumentMask::new(mask)),
            update_transforms: transforms,
            current_document: Some(Precondition { exists: Some(true) }),
        };
        self.commit(write, id).await
    }

    /// Close an incident: status becomes CLOSED and `closed_at` is stamped
    /// with the store's request time.
    ///
    /// No current-status check is performed; re-closing re-stamps
    /// `closed_at`.
    #[instrument(skip(self))]
    pub async fn close(&self, id: &str) -> Result<(), StoreError> {
        debug!("Closing incident {}", id);
        let mut fields = BTreeMap::new();
        fields.insert(
            "status".to_string(),
            FieldValue::string(Status::Closed.as_str()),
        );
        self.update(
            id,
            fields,
            &["status"],
            vec![FieldTransform::request_time("closed_at")],
        )
        .await
    }

    /// Reopen an incident: status becomes OPEN and `closed_at` is removed
    /// from the document entirely (named in the mask, absent from the write).
    #[instrument(skip(self))]
    pub async fn reopen(&self, id: &str) -> Result<(), StoreError> {
        debug!("Reopening incident {}", id);
        let mut fields = BTreeMap::new();
        fields.insert(
            "status".to_string(),
            FieldValue::string(Status::Open.as_str()),
        );
        self.update(id, fields, &["status", "closed_at"], Vec::new())
            .await
    }

    /// Apply a single write through `commit`.
    async fn commit(&self, write: Write, id: &str) -> Result<(), StoreError> {
        let url = self.documents_url(":commit");
        let request = CommitRequest {
            writes: vec![write],
        };
        let response = self.request(Method::POST, &url).json(&request).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Incident {} not found", id);
            return Err(StoreError::NotFound(id.to_string()));
        }

        match self.handle_response::<CommitResponse>(response).await {
            Ok(_) => Ok(()),
            // A failed existence precondition surfaces as a NOT_FOUND status
            // in the error body.
            Err(StoreError::Api { ref message, .. }) if message.contains("NOT_FOUND") => {
                warn!("Incident {} not found", id);
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, StoreError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("Firestore rejected the configured credentials ({})", status.as_u16());
            return Err(StoreError::PermissionDenied);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Firestore API error ({}): {}", status.as_u16(), message);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    /// Full resource name of an incident document.
    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_path(), COLLECTION, id)
    }

    /// Full request URL under the documents root.
    fn documents_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.documents_path(),
            suffix
        )
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(ref token) = self.config.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = FirestoreClient::new(StoreConfig::for_project("demo-project"));
        assert_eq!(
            client.document_name("abc"),
            "projects/demo-project/databases/(default)/documents/incidents/abc"
        );
    }

    #[test]
    fn test_documents_url() {
        let mut config = StoreConfig::for_project("demo-project");
        config.base_url = "http://localhost:9099/v1/".to_string();
        let client = FirestoreClient::new(config);
        assert_eq!(
            client.documents_url(":runQuery"),
            "http://localhost:9099/v1/projects/demo-project/databases/(default)/documents:runQuery"
        );
        assert_eq!(
            client.documents_url("/incidents/abc"),
            "http://localhost:9099/v1/projects/demo-project/databases/(default)/documents/incidents/abc"
        );
    }
}
