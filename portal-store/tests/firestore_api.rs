//! Integration tests for the Firestore-backed incident store.
//!
//! These tests verify the exact REST traffic the adapter produces: commit
//! writes with server-time transforms, update masks for the close/reopen
//! transitions, and the runQuery listing. We use wiremock to simulate the
//! Firestore endpoint and inspect the recorded requests.

use portal_store::convert::Document;
use portal_store::{FirestoreClient, NewIncident, Severity, Status, StoreConfig, StoreError};
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMIT_PATH: &str = "/projects/demo-project/databases/(default)/documents:commit";
const RUN_QUERY_PATH: &str = "/projects/demo-project/databases/(default)/documents:runQuery";

/// Test fixture providing a mock Firestore endpoint.
struct TestFixture {
    server: MockServer,
}

impl TestFixture {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn client(&self) -> FirestoreClient {
        let mut config = StoreConfig::for_project("demo-project");
        config.base_url = self.server.uri();
        config.access_token = Some("test-token".to_string());
        FirestoreClient::new(config)
    }

    /// The body of the single commit request the server received.
    async fn commit_body(&self) -> serde_json::Value {
        let requests = self.server.received_requests().await.unwrap();
        let commit = requests
            .iter()
            .find(|r| r.url.path().ends_with(":commit"))
            .expect("no commit request recorded");
        serde_json::from_slice(&commit.body).unwrap()
    }
}

/// A stored incident document as Firestore would return it.
fn incident_document(id: &str, status: Option<&str>, created_at: &str) -> serde_json::Value {
    let mut fields = json!({
        "incident_id": {"stringValue": format!("INC-{}", id)},
        "severity": {"stringValue": "HIGH"},
        "title": {"stringValue": "db down"},
        "description": {"stringValue": "primary db unreachable"},
        "affected_services": {"arrayValue": {"values": [
            {"stringValue": "db"},
            {"stringValue": "api"},
            {"stringValue": "auth"},
        ]}},
        "compliance_risk": {"stringValue": "NONE"},
        "recommended_actions": {"arrayValue": {"values": [
            {"stringValue": "restart db"},
            {"stringValue": "rotate keys"},
        ]}},
        "created_by": {"stringValue": "triage-agent"},
        "created_at": {"timestampValue": created_at},
    });
    if let Some(status) = status {
        fields["status"] = json!({"stringValue": status});
    }
    json!({
        "name": format!(
            "projects/demo-project/databases/(default)/documents/incidents/{}",
            id
        ),
        "fields": fields,
        "createTime": created_at,
        "updateTime": created_at,
    })
}

fn commit_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "writeResults": [{"updateTime": "2024-05-01T12:00:00Z"}],
        "commitTime": "2024-05-01T12:00:00Z",
    }))
}

#[tokio::test]
async fn test_create_normalizes_and_stamps_server_time() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(
            r"^/projects/demo-project/databases/\(default\)/documents/incidents/[0-9a-f]{32}$",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(incident_document("abc123", Some("OPEN"), "2024-05-01T12:00:00Z")),
        )
        .expect(1)
        .mount(&fixture.server)
        .await;

    let payload: NewIncident = serde_json::from_value(json!({
        "incident_id": "INC-CRIT-1001",
        "severity": "HIGH",
        "title": "db down",
        "affected_services": "db, api, auth",
        "recommended_actions": "restart db\nrotate keys",
    }))
    .unwrap();

    let incident = fixture
        .client()
        .create(payload, "triage-agent")
        .await
        .unwrap();
    assert_eq!(incident.status, Status::Open);
    assert_eq!(incident.severity, Severity::High);
    assert!(incident.closed_at.is_none());

    let body = fixture.commit_body().await;
    let write = &body["writes"][0];

    // Delimited inputs were normalized to arrays before the write.
    assert_eq!(
        write["update"]["fields"]["affected_services"]["arrayValue"]["values"],
        json!([
            {"stringValue": "db"},
            {"stringValue": "api"},
            {"stringValue": "auth"},
        ])
    );
    assert_eq!(
        write["update"]["fields"]["recommended_actions"]["arrayValue"]["values"],
        json!([
            {"stringValue": "restart db"},
            {"stringValue": "rotate keys"},
        ])
    );

    // New documents open, created_at comes from the server, closed_at absent.
    assert_eq!(
        write["update"]["fields"]["status"],
        json!({"stringValue": "OPEN"})
    );
    assert!(write["update"]["fields"].get("created_at").is_none());
    assert!(write["update"]["fields"].get("closed_at").is_none());
    assert_eq!(
        write["updateTransforms"],
        json!([{"fieldPath": "created_at", "setToServerValue": "REQUEST_TIME"}])
    );
    assert_eq!(write["currentDocument"], json!({"exists": false}));
}

#[tokio::test]
async fn test_get_unknown_id_returns_none() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path(
            "/projects/demo-project/databases/(default)/documents/incidents/missing",
        ))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Document not found.", "status": "NOT_FOUND"}
        })))
        .mount(&fixture.server)
        .await;

    let result = fixture.client().get("missing").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_close_sets_status_and_restamps_closed_at() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&fixture.server)
        .await;

    fixture.client().close("abc123").await.unwrap();

    let body = fixture.commit_body().await;
    let write = &body["writes"][0];
    assert_eq!(
        write["update"]["fields"],
        json!({"status": {"stringValue": "CLOSED"}})
    );
    assert_eq!(write["updateMask"], json!({"fieldPaths": ["status"]}));
    assert_eq!(
        write["updateTransforms"],
        json!([{"fieldPath": "closed_at", "setToServerValue": "REQUEST_TIME"}])
    );
    assert_eq!(write["currentDocument"], json!({"exists": true}));
}

#[tokio::test]
async fn test_reopen_removes_closed_at_entirely() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(commit_ok())
        .expect(1)
        .mount(&fixture.server)
        .await;

    fixture.client().reopen("abc123").await.unwrap();

    let body = fixture.commit_body().await;
    let write = &body["writes"][0];

    // closed_at is named in the mask but absent from the write, which
    // deletes the field rather than nulling it.
    assert_eq!(
        write["update"]["fields"],
        json!({"status": {"stringValue": "OPEN"}})
    );
    assert_eq!(
        write["updateMask"],
        json!({"fieldPaths": ["status", "closed_at"]})
    );
    assert!(write.get("updateTransforms").is_none());
}

#[tokio::test]
async fn test_close_unknown_id_is_not_found() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "No document to update", "status": "NOT_FOUND"}
        })))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().close("missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "missing"));
}

#[tokio::test]
async fn test_list_keeps_store_order_and_filters_client_side() {
    let fixture = TestFixture::new().await;

    // Store-side ordering: newest first. The second document has no status
    // field and must read as OPEN.
    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": incident_document("newer", Some("CLOSED"), "2024-05-02T09:00:00Z"),
             "readTime": "2024-05-03T00:00:00Z"},
            {"document": incident_document("older", None, "2024-05-01T12:00:00Z"),
             "readTime": "2024-05-03T00:00:00Z"},
            {"readTime": "2024-05-03T00:00:00Z"},
        ])))
        .expect(3)
        .mount(&fixture.server)
        .await;

    let client = fixture.client();

    let all = client.list(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "newer");
    assert_eq!(all[1].id, "older");

    let open = client.list(Some(Status::Open)).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, "older");
    assert_eq!(open[0].status, Status::Open);

    let closed = client.list(Some(Status::Closed)).await.unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, "newer");
}

#[tokio::test]
async fn test_list_empty_collection_returns_empty_vec() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path(RUN_QUERY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"readTime": "2024-05-03T00:00:00Z"}])),
        )
        .mount(&fixture.server)
        .await;

    let incidents = fixture.client().list(None).await.unwrap();
    assert!(incidents.is_empty());
}

#[tokio::test]
async fn test_rejected_credentials_reported_as_permission_denied() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path(
            "/projects/demo-project/databases/(default)/documents/incidents/abc123",
        ))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Missing auth token.", "status": "UNAUTHENTICATED"}
        })))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().get("abc123").await.unwrap_err();
    assert!(matches!(err, StoreError::PermissionDenied));
}

#[test]
fn test_run_query_entry_decodes_without_document() {
    let entry: portal_store::convert::RunQueryEntry =
        serde_json::from_value(json!({"readTime": "2024-05-03T00:00:00Z"})).unwrap();
    assert!(entry.document.is_none());

    let document: Document = serde_json::from_value(incident_document(
        "abc123",
        Some("OPEN"),
        "2024-05-01T12:00:00Z",
    ))
    .unwrap();
    assert!(document.name.is_some());
}
