//! The incident data model.
//!
//! An incident is the sole persisted entity: a ticket record for an
//! operational issue, created by an agent or a portal user and mutated only
//! by the close/reopen transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incident severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Low severity.
    Low,
    /// Medium severity (the default).
    #[default]
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

impl Severity {
    /// Wire representation of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Parse a wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Compliance risk attached to an incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceRisk {
    /// No compliance risk (the default).
    #[default]
    None,
    /// Low compliance risk.
    Low,
    /// Medium compliance risk.
    Medium,
    /// High compliance risk.
    High,
}

impl ComplianceRisk {
    /// Wire representation of this risk level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceRisk::None => "NONE",
            ComplianceRisk::Low => "LOW",
            ComplianceRisk::Medium => "MEDIUM",
            ComplianceRisk::High => "HIGH",
        }
    }

    /// Parse a wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(ComplianceRisk::None),
            "LOW" => Some(ComplianceRisk::Low),
            "MEDIUM" => Some(ComplianceRisk::Medium),
            "HIGH" => Some(ComplianceRisk::High),
            _ => None,
        }
    }
}

/// Lifecycle status of an incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Incident is open (the default).
    #[default]
    Open,
    /// Incident has been closed.
    Closed,
}

impl Status {
    /// Wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Closed => "CLOSED",
        }
    }

    /// Parse a wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Status::Open),
            "CLOSED" => Some(Status::Closed),
            _ => None,
        }
    }
}

/// A persisted incident record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Document id assigned by the store; immutable.
    pub id: String,

    /// Caller-supplied human label (e.g. "INC-CRIT-1001"); not unique.
    pub incident_id: String,

    /// Severity.
    pub severity: Severity,

    /// Short title.
    pub title: String,

    /// Description of the incident.
    pub description: String,

    /// Affected service names.
    pub affected_services: Vec<String>,

    /// Compliance risk.
    pub compliance_risk: ComplianceRisk,

    /// Recommended remediation actions.
    pub recommended_actions: Vec<String>,

    /// Lifecycle status.
    pub status: Status,

    /// Identity of the creator (agent name or user name).
    pub created_by: String,

    /// Server-assigned creation time; never modified.
    pub created_at: DateTime<Utc>,

    /// Server-assigned close time; present only while the incident is closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// A list-valued field that callers may supply either as a sequence or as a
/// delimited string (comma-separated for services, newline-separated for
/// actions). The portal form sends delimited text; agents send arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    /// Already a sequence.
    List(Vec<String>),
    /// Delimited text, split at the adapter boundary.
    Text(String),
}

impl Default for StringOrList {
    fn default() -> Self {
        StringOrList::Text(String::new())
    }
}

impl StringOrList {
    /// Normalize to a canonical sequence: split delimited text on `separator`,
    /// trim every entry, drop empties.
    pub fn into_list(self, separator: char) -> Vec<String> {
        let items = match self {
            StringOrList::List(items) => items,
            StringOrList::Text(text) => {
                text.split(separator).map(|s| s.to_string()).collect()
            }
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Create payload as received from a caller, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewIncident {
    /// Caller-supplied human label.
    #[serde(default)]
    pub incident_id: String,

    /// Severity; defaults to MEDIUM.
    #[serde(default)]
    pub severity: Severity,

    /// Short title.
    #[serde(default)]
    pub title: String,

    /// Description.
    #[serde(default)]
    pub description: String,

    /// Affected services, as a sequence or comma-separated text.
    #[serde(default)]
    pub affected_services: StringOrList,

    /// Compliance risk; defaults to NONE.
    #[serde(default)]
    pub compliance_risk: ComplianceRisk,

    /// Recommended actions, as a sequence or newline-separated text.
    #[serde(default)]
    pub recommended_actions: StringOrList,
}

impl NewIncident {
    /// Normalize into a draft ready for persistence. This is the single
    /// normalization point for the dual-shape list fields.
    pub fn into_draft(self, created_by: &str) -> IncidentDraft {
        IncidentDraft {
            incident_id: self.incident_id,
            severity: self.severity,
            title: self.title,
            description: self.description,
            affected_services: self.affected_services.into_list(','),
            compliance_risk: self.compliance_risk,
            recommended_actions: self.recommended_actions.into_list('\n'),
            created_by: created_by.to_string(),
        }
    }
}

/// Fully-normalized create payload.
#[derive(Debug, Clone)]
pub struct IncidentDraft {
    /// Caller-supplied human label.
    pub incident_id: String,
    /// Severity.
    pub severity: Severity,
    /// Short title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Affected services, normalized.
    pub affected_services: Vec<String>,
    /// Compliance risk.
    pub compliance_risk: ComplianceRisk,
    /// Recommended actions, normalized.
    pub recommended_actions: Vec<String>,
    /// Identity of the creator.
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_wire_forms() {
        assert_eq!(Severity::Critical.as_str(), "CRITICAL");
        assert_eq!(Severity::parse("LOW"), Some(Severity::Low));
        assert_eq!(Severity::parse("URGENT"), None);
        assert_eq!(
            serde_json::to_value(Severity::High).unwrap(),
            serde_json::json!("HIGH")
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Severity::default(), Severity::Medium);
        assert_eq!(ComplianceRisk::default(), ComplianceRisk::None);
        assert_eq!(Status::default(), Status::Open);
    }

    #[test]
    fn test_comma_separated_services() {
        let input = StringOrList::Text("db, api, auth".to_string());
        assert_eq!(input.into_list(','), vec!["db", "api", "auth"]);
    }

    #[test]
    fn test_newline_separated_actions() {
        let input = StringOrList::Text("restart db\nrotate keys".to_string());
        assert_eq!(input.into_list('\n'), vec!["restart db", "rotate keys"]);
    }

    #[test]
    fn test_empty_entries_dropped() {
        let input = StringOrList::Text("db,, ,api".to_string());
        assert_eq!(input.into_list(','), vec!["db", "api"]);

        let input = StringOrList::List(vec![
            " db ".to_string(),
            String::new(),
            "api".to_string(),
        ]);
        assert_eq!(input.into_list(','), vec!["db", "api"]);
    }

    #[test]
    fn test_empty_text_normalizes_to_empty_list() {
        assert!(StringOrList::default().into_list(',').is_empty());
    }

    #[test]
    fn test_new_incident_deserializes_both_shapes() {
        let from_agent: NewIncident = serde_json::from_value(serde_json::json!({
            "incident_id": "INC-1",
            "severity": "HIGH",
            "title": "db down",
            "affected_services": ["db", "api"],
        }))
        .unwrap();
        let draft = from_agent.into_draft("triage-agent");
        assert_eq!(draft.affected_services, vec!["db", "api"]);
        assert_eq!(draft.compliance_risk, ComplianceRisk::None);

        let from_form: NewIncident = serde_json::from_value(serde_json::json!({
            "incident_id": "INC-2",
            "severity": "LOW",
            "title": "slow api",
            "affected_services": "db, api, auth",
            "recommended_actions": "restart db\nrotate keys",
        }))
        .unwrap();
        let draft = from_form.into_draft("admin");
        assert_eq!(draft.affected_services, vec!["db", "api", "auth"]);
        assert_eq!(draft.recommended_actions, vec!["restart db", "rotate keys"]);
        assert_eq!(draft.created_by, "admin");
    }

    #[test]
    fn test_invalid_severity_rejected() {
        let result: Result<NewIncident, _> = serde_json::from_value(serde_json::json!({
            "incident_id": "INC-3",
            "severity": "PENDING",
            "title": "x",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_incident_serializes_timestamps_iso8601() {
        let incident = Incident {
            id: "abc".to_string(),
            incident_id: "INC-1".to_string(),
            severity: Severity::Medium,
            title: String::new(),
            description: String::new(),
            affected_services: Vec::new(),
            compliance_risk: ComplianceRisk::None,
            recommended_actions: Vec::new(),
            status: Status::Open,
            created_by: "triage-agent".to_string(),
            created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
            closed_at: None,
        };
        let value = serde_json::to_value(&incident).unwrap();
        assert_eq!(value["created_at"], "2024-05-01T12:00:00Z");
        assert!(value.get("closed_at").is_none());
    }
}
