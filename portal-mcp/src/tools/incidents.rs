//! Incident MCP tools
//!
//! Tools for creating, listing, closing, and reopening incident tickets.
//! Each tool maps one schema-validated operation onto the document store
//! adapter and formats the result as text plus structured data.

use std::sync::Arc;

use async_trait::async_trait;
use portal_store::{ComplianceRisk, NewIncident, Severity, Status, StoreError, StringOrList};
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::server::{AGENT_IDENTITY, McpServerError, McpServerResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolResult};

/// Wrap structured items the way the portal's callers expect:
/// `{"results": [{"type": "json", "data": ...}, ...]}`.
fn json_results(items: Vec<serde_json::Value>) -> serde_json::Value {
    let results: Vec<_> = items
        .into_iter()
        .map(|data| serde_json::json!({"type": "json", "data": data}))
        .collect();
    serde_json::json!({ "results": results })
}

/// Report a store failure as a tool-level error result.
///
/// An unknown document id is a caller mistake and is named as such; every
/// other store fault is logged server-side and reported generically so
/// store diagnostics never reach the caller.
fn store_failure(action: &str, err: &StoreError) -> ToolResult {
    if let StoreError::NotFound(id) = err {
        return ToolResult::error(format!("Incident not found: {}", id));
    }
    error!("Failed to {}: {}", action, err);
    ToolResult::error(format!("Failed to {}: incident store unavailable", action))
}

fn decode_params<T>(args: serde_json::Value) -> McpServerResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

/// Tool to create an incident ticket.
///
/// Writes a new document to the incident collection with `created_by` fixed
/// to the agent identity. Accepts the dual-shape list fields (array or
/// delimited string); normalization happens at the store boundary.
pub struct CreateIncidentTool;

#[async_trait]
impl Tool for CreateIncidentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_incident",
            "Create a new incident ticket in the incident portal. Use when escalation \
             is required.",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "incident_id": {
                    "type": "string",
                    "description": "Human label, e.g. INC-CRIT-1001"
                },
                "severity": {
                    "type": "string",
                    "enum": ["LOW", "MEDIUM", "HIGH", "CRITICAL"],
                    "description": "Severity"
                },
                "title": {
                    "type": "string",
                    "description": "Short title"
                },
                "description": {
                    "type": "string",
                    "description": "Description of the incident"
                },
                "affected_services": {
                    "description": "Comma-separated or array of affected service names",
                    "oneOf": [
                        {"type": "string"},
                        {"type": "array", "items": {"type": "string"}}
                    ]
                },
                "compliance_risk": {
                    "type": "string",
                    "enum": ["NONE", "LOW", "MEDIUM", "HIGH"],
                    "description": "Compliance risk",
                    "default": "NONE"
                },
                "recommended_actions": {
                    "description": "Recommended actions (array or newline-separated string)",
                    "oneOf": [
                        {"type": "string"},
                        {"type": "array", "items": {"type": "string"}}
                    ]
                }
            },
            "required": ["incident_id", "severity", "title"]
        }))
    }

    #[instrument(skip(self, args, context), fields(tool = "create_incident"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: CreateIncidentParams = decode_params(args)?;

        debug!("Creating incident {}", params.incident_id);

        let store = match portal_store::shared_client() {
            Ok(store) => store,
            Err(e) => return Ok(store_failure("create incident", &e)),
        };

        let payload = NewIncident {
            incident_id: params.incident_id,
            severity: params.severity,
            title: params.title,
            description: params.description,
            affected_services: params.affected_services,
            compliance_risk: params.compliance_risk,
            recommended_actions: params.recommended_actions,
        };
        let created_by = context.created_by.as_deref().unwrap_or(AGENT_IDENTITY);

        match store.create(payload, created_by).await {
            Ok(incident) => {
                let text = format!(
                    "Created incident {} (id: {})",
                    incident.incident_id, incident.id
                );
                let data = serde_json::to_value(&incident)
                    .map_err(|e| McpServerError::Internal(e.to_string()))?;
                Ok(ToolResult::text(text).with_structured(json_results(vec![data])))
            }
            Err(e) => Ok(store_failure("create incident", &e)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateIncidentParams {
    incident_id: String,
    severity: Severity,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    affected_services: StringOrList,
    #[serde(default)]
    compliance_risk: ComplianceRisk,
    #[serde(default)]
    recommended_actions: StringOrList,
}

/// Tool to list incident tickets.
///
/// Returns incidents ordered by creation time descending, optionally
/// filtered by status.
pub struct ListIncidentsTool;

#[async_trait]
impl Tool for ListIncidentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_incidents",
            "List incident tickets from the incident portal, ordered by created_at \
             descending. Optionally filter by status (OPEN or CLOSED).",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["OPEN", "CLOSED"],
                    "description": "Filter by status: OPEN or CLOSED"
                }
            },
            "required": []
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "list_incidents"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: ListIncidentsParams = decode_params(args)?;

        let store = match portal_store::shared_client() {
            Ok(store) => store,
            Err(e) => return Ok(store_failure("list incidents", &e)),
        };

        match store.list(params.status).await {
            Ok(incidents) => {
                let text = format!("Listed {} incident(s)", incidents.len());
                let mut items = Vec::with_capacity(incidents.len());
                for incident in &incidents {
                    items.push(
                        serde_json::to_value(incident)
                            .map_err(|e| McpServerError::Internal(e.to_string()))?,
                    );
                }
                let structured = json_results(items);
                let rendered = serde_json::to_string(&structured)
                    .map_err(|e| McpServerError::Internal(e.to_string()))?;
                Ok(ToolResult::text(text)
                    .with_text(rendered)
                    .with_structured(structured))
            }
            Err(e) => Ok(store_failure("list incidents", &e)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListIncidentsParams {
    #[serde(default)]
    status: Option<Status>,
}

/// Tool to close an incident ticket.
///
/// Sets status to CLOSED and records `closed_at`. Takes the document id
/// (from `list_incidents`), not the human label.
pub struct CloseIncidentTool;

#[async_trait]
impl Tool for CloseIncidentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "close_incident",
            "Close an incident ticket. Pass the document id (from list_incidents). \
             Sets status to CLOSED and records closed_at.",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Document id of the incident (from list_incidents)"
                }
            },
            "required": ["id"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "close_incident"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: IncidentIdParams = decode_params(args)?;

        debug!("Closing incident {}", params.id);

        let store = match portal_store::shared_client() {
            Ok(store) => store,
            Err(e) => return Ok(store_failure("close incident", &e)),
        };

        match store.close(&params.id).await {
            Ok(()) => {
                let structured = json_results(vec![serde_json::json!({
                    "id": params.id,
                    "status": Status::Closed,
                })]);
                Ok(ToolResult::text(format!("Closed incident {}", params.id))
                    .with_structured(structured))
            }
            Err(e) => Ok(store_failure("close incident", &e)),
        }
    }
}

/// Tool to reopen a closed incident ticket.
///
/// Sets status to OPEN and clears `closed_at`.
pub struct ReopenIncidentTool;

#[async_trait]
impl Tool for ReopenIncidentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "reopen_incident",
            "Reopen a closed incident ticket. Pass the document id (from \
             list_incidents). Sets status to OPEN and clears closed_at.",
        )
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "Document id of the incident (from list_incidents)"
                }
            },
            "required": ["id"]
        }))
    }

    #[instrument(skip(self, args, _context), fields(tool = "reopen_incident"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let params: IncidentIdParams = decode_params(args)?;

        debug!("Reopening incident {}", params.id);

        let store = match portal_store::shared_client() {
            Ok(store) => store,
            Err(e) => return Ok(store_failure("reopen incident", &e)),
        };

        match store.reopen(&params.id).await {
            Ok(()) => {
                let structured = json_results(vec![serde_json::json!({
                    "id": params.id,
                    "status": Status::Open,
                })]);
                Ok(ToolResult::text(format!("Reopened incident {}", params.id))
                    .with_structured(structured))
            }
            Err(e) => Ok(store_failure("reopen incident", &e)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IncidentIdParams {
    id: String,
}

/// Get all incident tools.
///
/// Returns the fixed set of tools registered on every per-request server.
pub fn incident_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateIncidentTool),
        Arc::new(ListIncidentsTool),
        Arc::new(CloseIncidentTool),
        Arc::new(ReopenIncidentTool),
    ]
}
