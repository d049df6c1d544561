//! MCP tool implementations
//!
//! The fixed set of operations exposed to automated callers. Every tool
//! validates its arguments against a typed schema before any store access
//! and returns both a text summary and a structured payload.

pub mod incidents;

pub use incidents::{
    incident_tools, CloseIncidentTool, CreateIncidentTool, ListIncidentsTool, ReopenIncidentTool,
};
