//! # Portal MCP
//!
//! This crate provides the MCP (Model Context Protocol) server for the
//! Incident Portal, exposing incident ticketing operations to AI agents.
//!
//! ## Overview
//!
//! The portal-mcp crate handles:
//! - **Tools**: the fixed incident tool set with schema validation
//! - **JSON-RPC**: MCP protocol types and request dispatch
//! - **Results**: paired text + structured-content responses
//!
//! ## MCP Protocol
//!
//! This implementation follows the Model Context Protocol specification.
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! The server holds no session state; the HTTP endpoint constructs a fresh
//! instance per request and discards it with the response.
//!
//! ## Available Tools
//!
//! - `create_incident`: Create a new incident ticket
//! - `list_incidents`: List incident tickets, optionally by status
//! - `close_incident`: Close an incident ticket
//! - `reopen_incident`: Reopen a closed incident ticket
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portal_mcp::{incident_tools, McpRequest, McpServer};
//!
//! async fn handle(json: &str) {
//!     let server = McpServer::incident_portal();
//!     server.register_tools(incident_tools()).await;
//!
//!     let request: McpRequest = serde_json::from_str(json).unwrap();
//!     let response = server.handle_request(request).await;
//!     println!("{}", serde_json::to_string(&response).unwrap());
//! }
//! ```

pub mod server;
pub mod tools;
pub mod types;

// Re-export main types
pub use server::{
    McpServer, McpServerError, McpServerResult, Tool, ToolContext, AGENT_IDENTITY,
    PROTOCOL_VERSION,
};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult,
};

// Re-export tool collections
pub use tools::incident_tools;
