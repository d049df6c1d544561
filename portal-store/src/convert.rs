//! Firestore document codec.
//!
//! Translates between the `Incident` model and the Firestore REST v1
//! representation: typed field values (`stringValue`, `timestampValue`,
//! `arrayValue`, ...), `Document` resources, and the `commit`/`runQuery`
//! request envelopes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::incident::{ComplianceRisk, Incident, IncidentDraft, Severity, Status};

/// A single Firestore field value.
///
/// Firestore encodes every value as a one-key object naming its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    /// Explicit null.
    NullValue(()),
    /// Boolean.
    BooleanValue(bool),
    /// 64-bit integer, carried as a decimal string on the wire.
    IntegerValue(String),
    /// Double.
    DoubleValue(f64),
    /// Timestamp (RFC 3339).
    TimestampValue(DateTime<Utc>),
    /// UTF-8 string.
    StringValue(String),
    /// Ordered array of values.
    ArrayValue(ArrayValue),
    /// Nested map of values.
    MapValue(MapValue),
}

impl FieldValue {
    /// A string value.
    pub fn string(s: impl Into<String>) -> Self {
        FieldValue::StringValue(s.into())
    }

    /// An array of string values.
    pub fn string_array(items: &[String]) -> Self {
        FieldValue::ArrayValue(ArrayValue {
            values: items.iter().cloned().map(FieldValue::StringValue).collect(),
        })
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::TimestampValue(t) => Some(*t),
            _ => None,
        }
    }

    fn as_string_list(&self) -> Vec<String> {
        match self {
            FieldValue::ArrayValue(array) => array
                .values
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// An array of field values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// The values; Firestore omits the key for empty arrays.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<FieldValue>,
}

/// A nested map of field values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// The entries; Firestore omits the key for empty maps.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
}

/// A Firestore document resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    /// Full resource name (`projects/../databases/../documents/..`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Document fields.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,

    /// Server-assigned creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,

    /// Server-assigned last-update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

/// A single write inside a `commit` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// The document to write.
    pub update: Document,

    /// Fields to change; a field named here but absent from `update` is
    /// deleted from the document. Omitted for full-document writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Server-side transforms applied after the update.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub update_transforms: Vec<FieldTransform>,

    /// Existence precondition for the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

/// A set of field paths.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    /// The field paths in the mask.
    pub field_paths: Vec<String>,
}

impl DocumentMask {
    /// Build a mask over the given field paths.
    pub fn new(paths: &[&str]) -> Self {
        Self {
            field_paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A server-side field transform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    /// The field to transform.
    pub field_path: String,

    /// Server value to set (only `REQUEST_TIME` is used here).
    pub set_to_server_value: String,
}

impl FieldTransform {
    /// Stamp `field_path` with the server's request time.
    pub fn request_time(field_path: &str) -> Self {
        Self {
            field_path: field_path.to_string(),
            set_to_server_value: "REQUEST_TIME".to_string(),
        }
    }
}

/// Existence precondition on a write.
#[derive(Debug, Clone, Serialize)]
pub struct Precondition {
    /// When `Some(true)`, the document must already exist; when
    /// `Some(false)`, it must not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

/// A `commit` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CommitRequest {
    /// The writes to apply atomically.
    pub writes: Vec<Write>,
}

/// A `commit` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitResponse {
    /// Per-write results.
    pub write_results: Vec<WriteResult>,

    /// Commit time.
    pub commit_time: Option<DateTime<Utc>>,
}

/// Result of a single write.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteResult {
    /// Update time of the written document.
    pub update_time: Option<DateTime<Utc>>,
}

/// One entry of a `runQuery` response stream.
///
/// Entries without a `document` key carry only read metadata and are skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunQueryEntry {
    /// The matched document, if any.
    pub document: Option<Document>,
}

/// Encode a normalized create payload as document fields.
///
/// `created_at` is not encoded here; it is stamped server-side via a
/// `REQUEST_TIME` transform on the create write.
pub fn draft_fields(draft: &IncidentDraft) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "incident_id".to_string(),
        FieldValue::string(&draft.incident_id),
    );
    fields.insert(
        "severity".to_string(),
        FieldValue::string(draft.severity.as_str()),
    );
    fields.insert("title".to_string(), FieldValue::string(&draft.title));
    fields.insert(
        "description".to_string(),
        FieldValue::string(&draft.description),
    );
    fields.insert(
        "affected_services".to_string(),
        FieldValue::string_array(&draft.affected_services),
    );
    fields.insert(
        "compliance_risk".to_string(),
        FieldValue::string(draft.compliance_risk.as_str()),
    );
    fields.insert(
        "recommended_actions".to_string(),
        FieldValue::string_array(&draft.recommended_actions),
    );
    fields.insert(
        "status".to_string(),
        FieldValue::string(Status::Open.as_str()),
    );
    fields.insert(
        "created_by".to_string(),
        FieldValue::string(&draft.created_by),
    );
    fields
}

/// Decode a document into an `Incident`.
///
/// Missing optional fields take the model defaults; a missing `status` reads
/// as OPEN. A document without a name or a `created_at` stamp is corrupt and
/// reported as an invalid response.
pub fn incident_from_document(doc: &Document) -> Result<Incident, StoreError> {
    let name = doc
        .name
        .as_deref()
        .ok_or_else(|| StoreError::InvalidResponse("document missing name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = &doc.fields;

    let status = match str_field(fields, "status") {
        Some(s) => Status::parse(s).ok_or_else(|| {
            StoreError::InvalidResponse(format!("document {} has invalid status {:?}", id, s))
        })?,
        None => Status::Open,
    };

    let severity = match str_field(fields, "severity") {
        Some(s) => Severity::parse(s).ok_or_else(|| {
            StoreError::InvalidResponse(format!("document {} has invalid severity {:?}", id, s))
        })?,
        None => Severity::default(),
    };

    let compliance_risk = match str_field(fields, "compliance_risk") {
        Some(s) => ComplianceRisk::parse(s).ok_or_else(|| {
            StoreError::InvalidResponse(format!(
                "document {} has invalid compliance_risk {:?}",
                id, s
            ))
        })?,
        None => ComplianceRisk::default(),
    };

    let created_at = timestamp_field(fields, "created_at").ok_or_else(|| {
        StoreError::InvalidResponse(format!("document {} missing created_at", id))
    })?;

    Ok(Incident {
        incident_id: owned_str_field(fields, "incident_id"),
        severity,
        title: owned_str_field(fields, "title"),
        description: owned_str_field(fields, "description"),
        affected_services: list_field(fields, "affected_services"),
        compliance_risk,
        recommended_actions: list_field(fields, "recommended_actions"),
        status,
        created_by: owned_str_field(fields, "created_by"),
        created_at,
        closed_at: timestamp_field(fields, "closed_at"),
        id,
    })
}

fn str_field<'a>(fields: &'a BTreeMap<String, FieldValue>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(|v| v.as_str())
}

fn owned_str_field(fields: &BTreeMap<String, FieldValue>, key: &str) -> String {
    str_field(fields, key).unwrap_or_default().to_string()
}

fn list_field(fields: &BTreeMap<String, FieldValue>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .map(|v| v.as_string_list())
        .unwrap_or_default()
}

fn timestamp_field(fields: &BTreeMap<String, FieldValue>, key: &str) -> Option<DateTime<Utc>> {
    fields.get(key).and_then(|v| v.as_timestamp())
}
